use actix_web::{
    HttpResponse, Responder, get,
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    web::{self, Bytes},
};
use futures_util::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::identity::OwnerId;
use crate::events::{CacheKey, Invalidation, InvalidationBus, JOB_MUTATION_KEYS};

/// Server-Sent Event frame telling the client which caches to refetch
fn invalidate_frame(keys: &[CacheKey]) -> Bytes {
    let data = serde_json::json!({ "keys": keys });
    Bytes::from(format!("event: invalidate\ndata: {}\n\n", data))
}

/// Resolves once the server starts shutting down, or its sender is gone
async fn shutdown_signal(mut shutdown_rx: watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}

/// The caller's own invalidations as SSE frames
///
/// A subscriber that falls behind gets a full invalidation in place of the
/// messages it missed. The stream ends when `shutdown_rx` flips to `true`.
fn owner_events(
    rx: broadcast::Receiver<Invalidation>,
    owner: OwnerId,
    shutdown_rx: watch::Receiver<bool>,
) -> impl Stream<Item = Result<Bytes, Infallible>> {
    let events = stream::unfold((rx, owner), |(mut rx, owner)| async move {
        loop {
            match rx.recv().await {
                Ok(msg) if msg.owner == owner => {
                    let frame = invalidate_frame(&msg.keys);
                    return Some((Ok(frame), (rx, owner)));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream for owner={} lagged by {} messages", owner, skipped);
                    return Some((Ok(invalidate_frame(&JOB_MUTATION_KEYS)), (rx, owner)));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });
    events.take_until(shutdown_signal(shutdown_rx))
}

#[get("/events")]
async fn invalidation_events(
    bus: web::Data<InvalidationBus>,
    shutdown_rx: web::Data<watch::Receiver<bool>>,
    owner: OwnerId,
) -> impl Responder {
    info!("Opening invalidation stream for owner={}", owner);
    HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(owner_events(bus.subscribe(), owner, shutdown_rx.get_ref().clone()))
}

pub fn events_config(config: &mut web::ServiceConfig) {
    config.service(invalidation_events);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};

    use crate::api::identity::IdentityConfig;

    #[actix_web::test]
    async fn stream_only_carries_the_owners_messages() {
        let bus = InvalidationBus::default();
        let owner = OwnerId::new("user_a").unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let events = owner_events(bus.subscribe(), owner.clone(), shutdown_rx);
        futures_util::pin_mut!(events);

        bus.publish(&OwnerId::new("user_b").unwrap(), &JOB_MUTATION_KEYS);
        bus.publish(&owner, &[CacheKey::Stats]);

        let frame = events.next().await.unwrap().unwrap();
        assert_eq!(
            frame,
            Bytes::from_static(b"event: invalidate\ndata: {\"keys\":[\"stats\"]}\n\n")
        );
    }

    #[actix_web::test]
    async fn stream_ends_when_bus_is_dropped() {
        let bus = InvalidationBus::default();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let events = owner_events(bus.subscribe(), OwnerId::new("user_a").unwrap(), shutdown_rx);
        futures_util::pin_mut!(events);
        drop(bus);

        assert!(events.next().await.is_none());
    }

    #[actix_web::test]
    async fn stream_ends_on_shutdown_while_bus_is_alive() {
        let bus = InvalidationBus::default();
        let owner = OwnerId::new("user_a").unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let events = owner_events(bus.subscribe(), owner.clone(), shutdown_rx);
        futures_util::pin_mut!(events);

        bus.publish(&owner, &[CacheKey::Jobs]);
        assert!(events.next().await.is_some());

        let stop = async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            shutdown_tx.send(true).unwrap();
        };
        let (next, _) = tokio::join!(events.next(), stop);
        assert!(next.is_none());
    }

    #[actix_web::test]
    async fn events_endpoint_requires_identity_and_streams() {
        let bus = InvalidationBus::default();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(bus.clone()))
                .app_data(web::Data::new(shutdown_rx))
                .app_data(web::Data::new(IdentityConfig::default()))
                .configure(events_config),
        )
        .await;

        let req = test::TestRequest::get().uri("/events").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let req = test::TestRequest::get()
            .uri("/events")
            .insert_header(("x-user-id", "user_a"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), "text/event-stream");
    }

    #[actix_web::test]
    async fn lagging_subscriber_gets_full_invalidation() {
        let bus = InvalidationBus::new(1);
        let owner = OwnerId::new("user_a").unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let events = owner_events(bus.subscribe(), owner.clone(), shutdown_rx);
        futures_util::pin_mut!(events);

        bus.publish(&owner, &[CacheKey::Jobs]);
        bus.publish(&owner, &[CacheKey::Charts]);

        let frame = events.next().await.unwrap().unwrap();
        assert_eq!(
            frame,
            Bytes::from_static(b"event: invalidate\ndata: {\"keys\":[\"jobs\",\"stats\",\"charts\"]}\n\n")
        );
    }
}
