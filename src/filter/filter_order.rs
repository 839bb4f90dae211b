use super::error::FilterError;
use super::filter_where::quote_column;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Most recently updated first; id breaks ties so paging is stable
    pub fn recent_first() -> Vec<FilterOrderInfo> {
        vec![
            FilterOrderInfo { column: "updated_at", sort: SortDirection::Desc },
            FilterOrderInfo { column: "id", sort: SortDirection::Desc },
        ]
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> Result<String, FilterError> {
        if infos.is_empty() {
            return Ok(String::new());
        }
        let parts = infos
            .iter()
            .map(|i| quote_column(i.column).map(|c| format!("{} {}", c, i.sort.to_sql())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_first_orders_by_update_then_id() {
        let sql = FilterOrder::generate(&FilterOrder::recent_first()).unwrap();
        assert_eq!(sql, "ORDER BY \"updated_at\" DESC, \"id\" DESC");
    }

    #[test]
    fn empty_order_generates_nothing() {
        assert_eq!(FilterOrder::generate(&[]).unwrap(), "");
    }
}
