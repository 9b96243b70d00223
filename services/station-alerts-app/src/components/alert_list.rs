//! Incoming alert list component

use crate::api::{fetch_json, AlertListResponse};
use leptos::prelude::*;

/// Fetches /api/alerts and displays alerts newest first
#[component]
pub fn AlertList() -> impl IntoView {
    let alerts = Resource::new(
        || (),
        |_| async move {
            fetch_json::<AlertListResponse>("/api/alerts")
                .await
                .unwrap_or_default()
        },
    );

    view! {
        <section style="border: 1px solid #dee2e6; padding: 0.5rem; overflow-y: auto; max-height: 80vh;">
            <h2>"Incoming Alerts"</h2>
            <Suspense fallback=move || view! { <p>"Loading alerts..."</p> }>
                {move || {
                    alerts.get().map(|data| match data {
                        AlertListResponse::Empty { placeholder } => {
                            view! { <p style="color: #6c757d;">{placeholder}</p> }.into_any()
                        }
                        AlertListResponse::Items { items } => {
                            items.into_iter().map(|item| {
                                let card = format!(
                                    "margin-bottom: 0.5rem; padding: 0.5rem; border: 1px solid #dee2e6; \
                                     border-left: 4px solid {}; border-radius: 0.25rem; background: #fef2f2;",
                                    item.color
                                );
                                let label = format!("color: {}; font-weight: 600;", item.color);
                                view! {
                                    <div style=card>
                                        <p style="margin: 0;">
                                            <b>"Type: "</b>
                                            <span style=label>{item.label}</span>
                                            {item.is_new.then(|| view! {
                                                <span style="background: #dc2626; color: #fff; border-radius: 0.25rem; padding: 0 0.4em; margin-left: 0.4em; font-size: 0.75em;">"NEW"</span>
                                            })}
                                        </p>
                                        <p style="margin: 0;"><b>"Time: "</b>{item.time}</p>
                                        <p style="margin: 0;"><b>"Location: "</b>{item.coordinates}</p>
                                    </div>
                                }
                            }).collect::<Vec<_>>().into_any()
                        }
                    })
                }}
            </Suspense>
        </section>
    }
}
