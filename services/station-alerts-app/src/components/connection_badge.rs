//! Connection badge component

use crate::api::{fetch_json, StatusResponse};
use leptos::prelude::*;

/// Text and badge colors for a connection state
pub fn badge_colors(connected: bool) -> (&'static str, &'static str) {
    if connected {
        ("#155724", "#d4edda")
    } else {
        ("#721c24", "#f8d7da")
    }
}

/// Fetches /api/status and shows Connected (green) or Disconnected (red)
#[component]
pub fn ConnectionBadge() -> impl IntoView {
    let status = Resource::new(
        || (),
        |_| async move {
            fetch_json::<StatusResponse>("/api/status")
                .await
                .unwrap_or_default()
        },
    );

    view! {
        <Suspense fallback=move || view! { <p>"Checking connection..."</p> }>
            {move || {
                status.get().map(|s| {
                    let (color, bg) = badge_colors(s.connected);
                    let label = if s.connected { "Connected" } else { "Disconnected" };
                    let style = format!(
                        "display: inline-block; padding: 0.25em 0.6em; border-radius: 0.25rem; \
                         font-size: 0.85em; font-weight: 600; color: {}; background-color: {};",
                        color, bg
                    );
                    view! {
                        <p>
                            "Station " <code>{s.station_id}</code> " "
                            <span style=style>{label}</span>
                        </p>
                    }
                })
            }}
        </Suspense>
    }
}
