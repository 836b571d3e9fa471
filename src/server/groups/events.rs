use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures_util::stream;

use crate::guard::{GroupEvent, GroupWatch};
use crate::server::AppState;
use crate::server::response::ApiError;

/// Streams the group as server-sent events: a `group` event with the current
/// record and after each change, then a final `removed` event.
pub async fn group_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let watch = GroupWatch::new(state.store.as_ref(), &id)?;
    let first = watch.current()?;
    if first == GroupEvent::Removed {
        return Err(ApiError::not_found("Group not found"));
    }

    let feed = stream::unfold(Some((watch, Some(first))), move |feed| {
        let id = id.clone();
        async move {
            let (mut watch, pending) = feed?;
            let event = match pending {
                Some(event) => event,
                None => match watch.next().await? {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!("Dropping event stream for group {}: {}", id, e);
                        return None;
                    }
                },
            };

            match event {
                GroupEvent::Updated(group) => Some((
                    Event::default().event("group").json_data(&group),
                    Some((watch, None)),
                )),
                GroupEvent::Removed => {
                    Some((Ok(Event::default().event("removed").data(id)), None))
                }
            }
        }
    });

    Ok::<_, ApiError>(Sse::new(feed).keep_alive(KeepAlive::default()))
}
