use crate::delta::{ChangeRecord, Delta, Deltas, StopHandle, resolve};
use crate::errors::{Error, Result};
use crate::requests::{DeltaQuery, GetDeltaStreamRequest};
use crate::response::{self, Options};
use serde_json::Value;
use std::ops::ControlFlow;
use std::time::Duration;
use tracing::debug;

pub(super) fn run<F>(
    deltas: &Deltas,
    timeout: Option<Duration>,
    stop: &StopHandle,
    mut on_record: F,
) -> Result<()>
where
    F: FnMut(Delta) -> ControlFlow<()>,
{
    let exclude_types = deltas.exclude_param();
    let request = GetDeltaStreamRequest::new(
        DeltaQuery {
            cursor: &deltas.cursor,
            exclude_types: exclude_types.as_deref(),
            expanded: deltas.expanded,
        },
        timeout,
    );

    let streaming = match deltas.api.stream(request, timeout) {
        Ok(streaming) => streaming,
        Err(Error::Http(e)) if e.is_timeout() => {
            debug!("Stream timed out before the response arrived");
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    if !response::is_success(streaming.status()) {
        let raw = streaming.into_raw()?;
        return response::interpret_response(&raw, &Options::object()).map(|_| ());
    }

    let api = &deltas.api;
    let frames = serde_json::Deserializer::from_reader(streaming.into_reader()).into_iter::<Value>();
    for frame in frames {
        if stop.is_stopped() {
            debug!("Stream stopped");
            return Ok(());
        }

        let value = match frame {
            Ok(value) => value,
            Err(e) if e.is_io() => {
                let e = nylas_http::Error::IO(e.into());
                if e.is_timeout() {
                    debug!("Stream timed out");
                    return Ok(());
                }
                return Err(Error::unexpected(e.to_string()));
            }
            Err(e) => return Err(Error::unexpected(e.to_string())),
        };

        let value = response::interpret_parsed(value, &Options::object())?;
        let change: ChangeRecord =
            serde_json::from_value(value).map_err(|e| Error::unexpected(e.to_string()))?;
        debug!(object = %change.object, event = %change.event, "Received delta frame");

        let Some(delta) = resolve(api.registry(), api.context(), deltas.expanded, change)? else {
            continue;
        };

        if stop.is_stopped() {
            debug!("Stream stopped");
            return Ok(());
        }

        if on_record(delta).is_break() {
            debug!("Stream ended by callback");
            return Ok(());
        }
    }

    debug!("Stream closed by server");
    Ok(())
}
