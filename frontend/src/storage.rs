use markflow_shared::{
    models::TokenPair,
    session::{REFRESH_TOKEN_KEY, SELECTED_MODEL_KEY, TOKEN_KEY},
    TokenStore,
};
use web_sys::{window, Storage};

fn local_storage() -> Option<Storage> {
    window().and_then(|win| win.local_storage().ok().flatten())
}

fn read(key: &str) -> Option<String> {
    local_storage()
        .and_then(|storage| storage.get_item(key).ok().flatten())
        .filter(|value| !value.is_empty())
}

fn write(key: &str, value: Option<&str>) {
    let Some(storage) = local_storage() else {
        return;
    };
    let result = match value {
        Some(value) => storage.set_item(key, value),
        None => storage.remove_item(key),
    };
    if let Err(err) = result {
        web_sys::console::error_1(&err);
    }
}

/// Token pair kept in `localStorage` under `token` / `refreshToken`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageTokenStore;

impl TokenStore for LocalStorageTokenStore {
    fn load(&self) -> Option<TokenPair> {
        read(TOKEN_KEY).map(|token| TokenPair {
            token,
            refresh_token: read(REFRESH_TOKEN_KEY),
        })
    }

    fn save(&self, tokens: &TokenPair) {
        write(TOKEN_KEY, Some(&tokens.token));
        write(REFRESH_TOKEN_KEY, tokens.refresh_token.as_deref());
    }

    fn clear(&self) {
        write(TOKEN_KEY, None);
        write(REFRESH_TOKEN_KEY, None);
    }
}

/// Model the user last picked for marking jobs.
pub fn selected_model() -> Option<String> {
    read(SELECTED_MODEL_KEY)
}

pub fn set_selected_model(model: &str) {
    write(SELECTED_MODEL_KEY, Some(model).filter(|model| !model.is_empty()));
}
