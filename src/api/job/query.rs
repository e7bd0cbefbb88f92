use serde::{de, Deserialize, Deserializer};
use sqlx::{Postgres, QueryBuilder};

use crate::api::identity::OwnerId;
use crate::db::models::JobRow;
use super::models::JobStatus;

/// Status filter value that disables status filtering
pub const STATUS_ALL: &str = "all";

/// Query string accepted by the job listing
///
/// Search forms submit every field, so empty values mean "not given".
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "jobStatus")]
    pub job_status: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<i64>,
}

impl ListParams {
    /// Requested status filter; `status` wins over `jobStatus` when both are set
    pub fn status_filter(&self) -> Option<&str> {
        [&self.status, &self.job_status]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .find(|s| !s.is_empty())
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => s.trim().parse().map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}

/// Predicate over one owner's jobs
///
/// The owner constraint is always present; search and status only narrow it.
/// The same filter renders the SQL `WHERE` clause for both the page query and
/// the count query, so the two can never disagree on what matches.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFilter {
    owner_id: String,
    search: Option<String>,
    status: Option<JobStatus>,
}

impl JobFilter {
    /// Filter matching every job of `owner`
    pub fn owned_by(owner: &OwnerId) -> Self {
        Self {
            owner_id: owner.as_str().to_string(),
            search: None,
            status: None,
        }
    }

    /// Build the filter from raw listing parameters
    ///
    /// # Returns
    /// - `Err(message)` if `status` is neither `all` nor a known status
    pub fn build(owner: &OwnerId, search: Option<&str>, status: Option<&str>) -> Result<Self, String> {
        let mut filter = Self::owned_by(owner);

        if let Some(search) = search.filter(|s| !s.is_empty()) {
            filter.search = Some(search.to_string());
        }

        if let Some(status) = status.filter(|s| !s.is_empty() && *s != STATUS_ALL) {
            filter.status = Some(status.parse()?);
        }

        Ok(filter)
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Append ` WHERE ...` for this filter to `builder`
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(" WHERE owner_id = ");
        builder.push_bind(self.owner_id.clone());

        // strpos keeps the match literal: '%' and '_' in the search text are not wildcards
        if let Some(search) = &self.search {
            builder.push(" AND (strpos(\"position\", ");
            builder.push_bind(search.clone());
            builder.push(") > 0 OR strpos(company, ");
            builder.push_bind(search.clone());
            builder.push(") > 0)");
        }

        if let Some(status) = self.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_str());
        }
    }

    /// Evaluate the predicate against an already loaded row
    pub fn matches(&self, job: &JobRow) -> bool {
        if job.owner_id != self.owner_id {
            return false;
        }
        if let Some(search) = &self.search {
            if !job.position.contains(search.as_str()) && !job.company.contains(search.as_str()) {
                return false;
            }
        }
        match self.status {
            Some(status) => job.status == status.as_str(),
            None => true,
        }
    }
}

/// Resolved page window of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Clamp caller input: pages start at 1, limits stay within `1..=max_limit`
    pub fn resolve(page: Option<i64>, limit: Option<i64>, default_limit: i64, max_limit: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit),
        }
    }

    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ceil(count / limit)`; an empty result has zero pages
    pub fn total_pages(&self, count: i64) -> i64 {
        if count <= 0 {
            return 0;
        }
        (count + self.limit - 1) / self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn owner(id: &str) -> OwnerId {
        OwnerId::new(id).unwrap()
    }

    fn row(owner_id: &str, position: &str, company: &str, status: &str) -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            position: position.into(),
            company: company.into(),
            location: "Berlin".into(),
            status: status.into(),
            mode: "full-time".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn where_sql(filter: &JobFilter) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM jobs");
        filter.push_where(&mut builder);
        builder.sql().to_string()
    }

    #[test]
    fn owner_clause_is_always_present() {
        let filter = JobFilter::build(&owner("user_a"), None, None).unwrap();
        assert_eq!(where_sql(&filter), "SELECT * FROM jobs WHERE owner_id = $1");
    }

    #[test]
    fn search_and_status_add_clauses() {
        let filter = JobFilter::build(&owner("user_a"), Some("Rust"), Some("interview")).unwrap();
        assert_eq!(
            where_sql(&filter),
            "SELECT * FROM jobs WHERE owner_id = $1 AND (strpos(\"position\", $2) > 0 OR strpos(company, $3) > 0) AND status = $4"
        );
    }

    #[test]
    fn empty_search_and_all_status_are_ignored() {
        let filter = JobFilter::build(&owner("user_a"), Some(""), Some("all")).unwrap();
        assert_eq!(filter, JobFilter::owned_by(&owner("user_a")));
    }

    #[test]
    fn empty_status_applies_no_filter() {
        let filter = JobFilter::build(&owner("user_a"), None, Some("")).unwrap();
        assert_eq!(filter, JobFilter::owned_by(&owner("user_a")));
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(JobFilter::build(&owner("user_a"), None, Some("hired")).is_err());
    }

    #[test]
    fn matches_position_or_company_case_sensitively() {
        let filter = JobFilter::build(&owner("user_a"), Some("Rust"), None).unwrap();
        assert!(filter.matches(&row("user_a", "Rust Engineer", "Acme", "pending")));
        assert!(filter.matches(&row("user_a", "Engineer", "Rustacean Ltd", "pending")));
        assert!(!filter.matches(&row("user_a", "rust engineer", "Acme", "pending")));
        assert!(!filter.matches(&row("user_b", "Rust Engineer", "Acme", "pending")));
    }

    #[test]
    fn wildcard_characters_match_literally() {
        let filter = JobFilter::build(&owner("user_a"), Some("50%_"), None).unwrap();
        assert!(filter.matches(&row("user_a", "Engineer 50%_ remote", "Acme", "pending")));
        assert!(!filter.matches(&row("user_a", "Engineer 500 remote", "Acme", "pending")));
        assert!(!where_sql(&filter).contains("LIKE"));
    }

    #[test]
    fn matches_status_exactly() {
        let filter = JobFilter::build(&owner("user_a"), None, Some("pending")).unwrap();
        assert!(filter.matches(&row("user_a", "Dev", "Acme", "pending")));
        assert!(!filter.matches(&row("user_a", "Dev", "Acme", "declined")));
    }

    fn params(query: &str) -> ListParams {
        actix_web::web::Query::<ListParams>::from_query(query).unwrap().into_inner()
    }

    #[test]
    fn blank_form_fields_count_as_absent() {
        let parsed = params("search=&jobStatus=&page=&limit=");
        assert_eq!(parsed.status_filter(), None);
        assert_eq!((parsed.page, parsed.limit), (None, None));
    }

    #[test]
    fn status_and_job_status_may_both_be_sent() {
        let parsed = params("status=pending&jobStatus=declined&page=2");
        assert_eq!(parsed.status_filter(), Some("pending"));
        assert_eq!(parsed.page, Some(2));

        let parsed = params("status=&jobStatus=declined");
        assert_eq!(parsed.status_filter(), Some("declined"));
    }

    #[test]
    fn non_numeric_page_still_fails_to_parse() {
        assert!(actix_web::web::Query::<ListParams>::from_query("page=two").is_err());
    }

    #[test]
    fn pagination_math() {
        let page = Pagination::resolve(Some(2), Some(10), 10, 100);
        assert_eq!(page.skip(), 10);
        assert_eq!(page.total_pages(15), 2);
        assert_eq!(page.total_pages(20), 2);
        assert_eq!(page.total_pages(21), 3);
        assert_eq!(page.total_pages(0), 0);
    }

    #[test]
    fn pagination_clamps_caller_input() {
        let page = Pagination::resolve(Some(0), Some(0), 10, 100);
        assert_eq!(page, Pagination { page: 1, limit: 1 });
        assert_eq!(page.skip(), 0);

        let page = Pagination::resolve(Some(-3), Some(5000), 10, 100);
        assert_eq!(page, Pagination { page: 1, limit: 100 });

        let page = Pagination::resolve(None, None, 10, 100);
        assert_eq!(page, Pagination { page: 1, limit: 10 });
    }
}
