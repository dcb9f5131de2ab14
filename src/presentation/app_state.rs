// Application state for HTTP handlers
use crate::application::dispatcher::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
}
