use dioxus::prelude::*;

use crate::app::AppState;

/// Places `state` in context for every descendant.
#[component]
pub fn AppProvider(state: AppState, children: Element) -> Element {
    use_context_provider(|| state.clone());
    rsx! {
        {children}
    }
}

/// The [`AppState`] provided by the nearest [`AppProvider`].
pub fn use_app() -> AppState {
    use_context::<AppState>()
}
