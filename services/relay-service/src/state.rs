use crate::client::CmsClient;

#[derive(Clone)]
pub struct AppState {
    pub cms: CmsClient,
}

impl AppState {
    pub fn new(cms: CmsClient) -> Self {
        Self { cms }
    }
}
