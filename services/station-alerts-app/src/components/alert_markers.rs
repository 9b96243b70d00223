//! Map marker table component

use crate::api::{fetch_json, MapResponse};
use leptos::prelude::*;

/// Fetches /api/map and lists the station and alert markers
#[component]
pub fn AlertMarkers() -> impl IntoView {
    let map = Resource::new(
        || (),
        |_| async move { fetch_json::<MapResponse>("/api/map").await.unwrap_or_default() },
    );

    view! {
        <section>
            <h2>"Map Markers"</h2>
            <Suspense fallback=move || view! { <p>"Loading map..."</p> }>
                {move || {
                    map.get().map(|data| {
                        if data.markers.is_empty() {
                            view! { <p>"Map not available."</p> }.into_any()
                        } else {
                            view! {
                                <table style="width: 100%; border-collapse: collapse;">
                                    <thead>
                                        <tr style="border-bottom: 2px solid #dee2e6;">
                                            <th style="padding: 0.5rem; text-align: left;">"Marker"</th>
                                            <th style="padding: 0.5rem; text-align: left;">"Time"</th>
                                            <th style="padding: 0.5rem; text-align: left;">"Location"</th>
                                        </tr>
                                    </thead>
                                    <tbody>
                                        {data.markers.into_iter().map(|m| {
                                            let title = format!("color: {}; font-weight: 600;", m.color);
                                            view! {
                                                <tr style="border-bottom: 1px solid #dee2e6;">
                                                    <td style="padding: 0.5rem;">
                                                        <span style=title>{m.popup.title}</span>
                                                    </td>
                                                    <td style="padding: 0.5rem;">{m.popup.time.unwrap_or_default()}</td>
                                                    <td style="padding: 0.5rem;">{m.popup.coordinates}</td>
                                                </tr>
                                            }
                                        }).collect::<Vec<_>>()}
                                    </tbody>
                                </table>
                            }.into_any()
                        }
                    })
                }}
            </Suspense>
        </section>
    }
}
