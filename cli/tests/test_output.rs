//! Integration tests.

#[cfg(test)]
mod tests {
    use markflow_cli::output::{or_dash, pager_line, status_cell, TextTable};
    use markflow_shared::{PageInfo, ResourceStatus};

    #[test]
    fn table_aligns_columns_under_a_rule() {
        let mut table = TextTable::new(&["ID", "NAME"]);
        table.row(vec!["1".to_string(), "Physics".to_string()]);
        table.row(vec!["42".to_string()]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.render("empty"), "ID  NAME\n--  -------\n1   Physics\n42");
    }

    #[test]
    fn empty_table_renders_placeholder() {
        let table = TextTable::new(&["ID"]);
        assert!(table.is_empty());
        assert_eq!(table.render("No groups yet."), "No groups yet.");
    }

    #[test]
    fn pager_line_marks_current_page_and_disabled_moves() {
        assert_eq!(
            pager_line(&PageInfo::new(2, 10, 47)),
            "page 2/5 (47 total)  « ‹ 1 [2] 3 4 5 › »"
        );
        assert_eq!(pager_line(&PageInfo::new(1, 10, 3)), "page 1/1 (3 total)  - - [1] - -");
    }

    #[test]
    fn status_and_optional_cells() {
        assert_eq!(
            status_cell(&ResourceStatus::parse(Some("completed"))),
            ResourceStatus::parse(Some("completed")).label()
        );
        assert!(status_cell(&ResourceStatus::parse(Some("processing"))).ends_with(" …"));
        assert_eq!(or_dash(None::<u32>), "-");
        assert_eq!(or_dash(Some(3)), "3");
    }
}
