//! Shared application state for all routes: one CRUD service over the active store.

use crate::service::CrudService;

#[derive(Clone)]
pub struct AppState {
    pub service: CrudService,
}

impl AppState {
    pub fn new(service: CrudService) -> Self {
        AppState { service }
    }
}
