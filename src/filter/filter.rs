use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{PageRequest, SqlResult};
use crate::database::models::{Post, PostStatus};
use crate::types::MemberId;

const TABLE: &str = "posts";

/// Criteria for listing visible posts. Absent fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub keyword: Option<String>,
    pub owner: Option<MemberId>,
}

impl PostFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: Option<PostStatus>) -> Self {
        self.status = status;
        self
    }

    /// An empty keyword is treated as no keyword; whitespace is matched as given
    pub fn keyword(mut self, keyword: Option<&str>) -> Self {
        self.keyword = keyword.filter(|k| !k.is_empty()).map(str::to_string);
        self
    }

    pub fn owner(mut self, owner: MemberId) -> Self {
        self.owner = Some(owner);
        self
    }

    fn where_sql(&self) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = FilterWhere::new(0);
        if let Some(status) = self.status {
            filter_where.eq("status", status.as_str());
        }
        if let Some(keyword) = &self.keyword {
            filter_where.contains_any("title,content", keyword);
        }
        if let Some(owner) = self.owner {
            filter_where.eq("member_id", owner);
        }
        filter_where.build()
    }

    /// Page of matching posts, newest update first
    pub fn to_sql(&self, page: PageRequest) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = self.where_sql()?;
        let order_clause = FilterOrder::generate(&FilterOrder::recent_first())?;
        let query = format!(
            "SELECT * FROM \"{}\" WHERE {} {} LIMIT {} OFFSET {}",
            TABLE,
            where_clause,
            order_clause,
            page.size,
            page.offset()
        );
        self.log_sql(&query, &params);
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = self.where_sql()?;
        let query = format!("SELECT COUNT(*) as count FROM \"{}\" WHERE {}", TABLE, where_clause);
        self.log_sql(&query, &params);
        Ok(SqlResult { query, params })
    }

    /// In-process equivalent of the generated WHERE clause, minus the owner
    /// visibility subquery which needs the member table.
    pub fn matches(&self, post: &Post) -> bool {
        if post.deleted {
            return false;
        }
        if let Some(status) = self.status {
            if post.status != status {
                return false;
            }
        }
        if let Some(keyword) = &self.keyword {
            if !post.title.contains(keyword.as_str()) && !post.content.contains(keyword.as_str()) {
                return false;
            }
        }
        if let Some(owner) = self.owner {
            if post.member_id != owner {
                return false;
            }
        }
        true
    }

    fn log_sql(&self, query: &str, params: &[Value]) {
        if crate::config::CONFIG.filter.debug_logging {
            tracing::debug!("Post filter SQL: {} params={:?}", query, params);
        }
    }
}
