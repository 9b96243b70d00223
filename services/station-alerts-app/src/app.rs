//! Main App component

use crate::components::alert_list::AlertList;
use crate::components::alert_markers::AlertMarkers;
use crate::components::connection_badge::ConnectionBadge;
use leptos::prelude::*;

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    view! {
        <main style="font-family: system-ui, sans-serif; margin: 0 auto; padding: 1rem;">
            <h1>"Police Dashboard"</h1>
            <ConnectionBadge />
            <div style="display: flex; gap: 1rem;">
                <div style="width: 33%;">
                    <AlertList />
                </div>
                <div style="width: 67%;">
                    <AlertMarkers />
                </div>
            </div>
        </main>
    }
}
