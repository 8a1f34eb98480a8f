//! Integration tests.

#[cfg(test)]
mod tests {
    use markflow_cli::session_file::{FileTokenStore, SessionFile};
    use markflow_shared::{models::TokenPair, TokenStore};
    use tempfile::TempDir;

    fn pair(token: &str, refresh: Option<&str>) -> TokenPair {
        TokenPair {
            token: token.to_string(),
            refresh_token: refresh.map(str::to_string),
        }
    }

    #[test]
    fn missing_file_opens_as_signed_out() {
        let dir = TempDir::new().expect("create temp dir");
        let store = FileTokenStore::open(dir.path().join("session.json")).expect("open store");

        assert_eq!(store.load(), None);
        assert_eq!(store.snapshot(), SessionFile::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn tokens_survive_a_reopen_and_clear_keeps_the_model() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("nested/deeper/session.json");

        let store = FileTokenStore::open(&path).expect("open store");
        store.save(&pair("access-1", Some("refresh-1")));
        store
            .set_selected_model("gpt-4o")
            .expect("remember model");
        assert!(path.exists());

        let reopened = FileTokenStore::open(&path).expect("reopen store");
        assert_eq!(reopened.access_token().as_deref(), Some("access-1"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("refresh-1"));
        assert_eq!(reopened.selected_model().as_deref(), Some("gpt-4o"));

        reopened.clear();
        let after_logout = FileTokenStore::open(&path).expect("reopen after clear");
        assert_eq!(after_logout.load(), None);
        assert_eq!(after_logout.selected_model().as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn refresh_token_is_dropped_when_the_server_omits_it() {
        let dir = TempDir::new().expect("create temp dir");
        let store = FileTokenStore::open(dir.path().join("session.json")).expect("open store");

        store.save(&pair("access-1", Some("refresh-1")));
        store.save(&pair("access-2", None));

        assert_eq!(store.access_token().as_deref(), Some("access-2"));
        assert_eq!(store.refresh_token(), None);
    }

    #[test]
    fn empty_file_is_treated_as_signed_out() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "  \n").expect("write empty file");

        let store = FileTokenStore::open(&path).expect("open store");
        assert_eq!(store.load(), None);
    }

    #[test]
    fn corrupt_file_is_reported_with_its_path() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").expect("write corrupt file");

        let err = FileTokenStore::open(&path).expect_err("corrupt file must not open");
        assert!(format!("{err:#}").contains("corrupt session file"));
    }
}
