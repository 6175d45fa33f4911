//! The envelope ingestor. Drains the host's startup scan once, then follows
//! its live mutation stream for as long as the manager lives, translating
//! each envelope into calls against the manager's public API. None of this
//! module touches the queue, registries, or ledger directly — everything
//! here is plumbing between [`Host`] and [`ComponentManager`].

use crate::host::Host;
use crate::manager::ComponentManager;
use djc_types::RawEnvelope;
use futures::future::{BoxFuture, FutureExt, Shared, try_join_all};
use futures::stream::StreamExt;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Runs the ingestor for `manager`'s lifetime: the startup scan followed by
/// the live mutation stream. Intended to be spawned once per manager.
pub async fn run_ingestor<H: Host>(manager: Arc<ComponentManager<H>>) {
    let mut seen = HashSet::new();

    for (element, text) in manager.host().scan_envelopes() {
        process_one(&manager, &mut seen, element, text).await;
    }

    let mut stream = manager.host().mutation_stream();
    while let Some((element, text)) = stream.next().await {
        process_one(&manager, &mut seen, element, text).await;
    }
}

/// Envelope elements are processed at most once, identified by host element
/// identity (not content — two envelopes can be byte-identical and still be
/// distinct DOM nodes).
async fn process_one<H: Host>(
    manager: &Arc<ComponentManager<H>>,
    seen: &mut HashSet<H::Element>,
    element: H::Element,
    text: String,
) {
    if !seen.insert(element) {
        return;
    }
    tracing::debug!("processing envelope");

    let raw: RawEnvelope = match serde_json::from_str(&text) {
        Ok(raw) => raw,
        Err(err) => {
            let message = format!("malformed envelope JSON: {err}");
            manager.host().log_diagnostic(&message);
            tracing::error!("{message}");
            return;
        }
    };

    let decoded = match raw.decode() {
        Ok(decoded) => decoded,
        Err(err) => {
            let message = format!("malformed envelope: {err}");
            manager.host().log_diagnostic(&message);
            tracing::error!("{message}");
            return;
        }
    };

    // Step 1: register every data-var binding before anything that might
    // need it executes.
    for var in decoded.js_vars {
        if let Err(err) = serde_json::from_str::<Value>(&var.json_text) {
            let message = format!(
                "data-var {}/{} carries invalid JSON, skipping: {err}",
                var.class_id, var.data_hash
            );
            manager.host().log_diagnostic(&message);
            tracing::error!("{message}");
            continue;
        }
        let json_text = var.json_text.clone();
        manager.register_data_factory(
            var.class_id,
            var.data_hash,
            Arc::new(move || {
                serde_json::from_str(&json_text).expect("validated at registration")
            }),
        );
    }

    // Step 2: URLs this envelope claims are already embedded elsewhere.
    for url in &decoded.css_urls_mark_as_loaded {
        if let Err(err) = manager.mark_loaded("stylesheet", url).await {
            tracing::error!(%err, %url, "markLoaded(stylesheet) failed");
        }
    }
    for url in &decoded.js_urls_mark_as_loaded {
        if let Err(err) = manager.mark_loaded("script", url).await {
            tracing::error!(%err, %url, "markLoaded(script) failed");
        }
    }

    // Step 3: fetch stylesheets, logging (not failing) individual errors.
    for tag in &decoded.css_tags_to_fetch {
        if let Err(err) = manager.load_stylesheet(tag).await {
            let message = format!("failed to load stylesheet: {err}");
            manager.host().log_diagnostic(&message);
            tracing::warn!("{message}");
        }
    }

    // Step 4: fetch scripts, collecting their wait-futures.
    let mut script_waits: Vec<BoxFuture<'static, Result<(), String>>> = Vec::new();
    for tag in &decoded.js_tags_to_fetch {
        match manager.load_script(tag).await {
            Ok((_element, wait)) => script_waits.push(wait),
            Err(err) => {
                let message = format!("failed to load script: {err}");
                manager.host().log_diagnostic(&message);
                tracing::warn!("{message}");
            }
        }
    }

    // Step 5: the combined wait-promise also covers script URLs this
    // envelope claims are already loaded — they might only actually finish
    // loading once a *different*, not-yet-processed envelope's script tag
    // resolves.
    let already_loaded_wait = match manager.wait_for("script", &decoded.js_urls_mark_as_loaded).await
    {
        Ok(wait) => wait,
        Err(err) => {
            tracing::error!(%err, "waitFor(script, ...) failed");
            return;
        }
    };
    script_waits.push(already_loaded_wait);

    let combined: Shared<BoxFuture<'static, Result<(), String>>> = async move {
        try_join_all(script_waits).await?;
        Ok(())
    }
    .boxed()
    .shared();

    // Step 6: enqueue every activation this envelope requests, each sharing
    // the same combined wait-promise.
    for call in decoded.js_calls {
        manager
            .enqueue(
                call.class_id,
                call.instance_id,
                call.data_hash,
                Some(combined.clone().boxed()),
            )
            .await;
    }
}
