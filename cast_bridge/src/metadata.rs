use crate::host::MediaHost;
use crate::protocol::IncomingMetadataPayload;
use tracing::debug;

pub const ARTWORK_WIDTH: u32 = 1024;
pub const ARTWORK_HEIGHT: u32 = 1024;
pub const ARTWORK_FORMAT: &str = "webp";

/// What the receiver currently displays. Replaced wholesale, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub artwork_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    Replaced(TrackMetadata),
    NoChange,
}

/// Replace-all-or-nothing: the incoming track wins only when title, artist
/// and album all differ from what is displayed.
pub fn reconcile(current: &TrackMetadata, incoming: &IncomingMetadataPayload) -> Reconciled {
    let all_differ = current.title != incoming.name
        && current.artist != incoming.artist_name
        && current.album != incoming.album_name;
    if !all_differ {
        return Reconciled::NoChange;
    }

    Reconciled::Replaced(TrackMetadata {
        title: incoming.name.clone(),
        artist: incoming.artist_name.clone(),
        album: incoming.album_name.clone(),
        artwork_url: incoming.artwork_url.as_deref().map(artwork_url),
    })
}

/// Fill the `{w}`/`{h}`/`{f}`/`{c}` tokens of an artwork template and drop the
/// `bb` bit-depth marker from the size suffix.
pub fn artwork_url(template: &str) -> String {
    let size = format!("{ARTWORK_WIDTH}x{ARTWORK_HEIGHT}");
    template
        .replace("{w}", &ARTWORK_WIDTH.to_string())
        .replace("{h}", &ARTWORK_HEIGHT.to_string())
        .replace("{f}", ARTWORK_FORMAT)
        .replace("{c}", "")
        .replace(&format!("{size}bb."), &format!("{size}."))
}

/// Reconcile against the host's displayed metadata and push the result back.
/// Returns whether the display changed.
pub fn synchronize(host: &dyn MediaHost, incoming: &IncomingMetadataPayload) -> bool {
    let current = host.displayed_metadata().unwrap_or_default();
    match reconcile(&current, incoming) {
        Reconciled::Replaced(next) => {
            debug!(title = %next.title, artist = %next.artist, album = %next.album, "metadata replaced");
            host.set_displayed_metadata(next);
            true
        }
        Reconciled::NoChange => {
            debug!(title = %incoming.name, "metadata unchanged (gate not met)");
            false
        }
    }
}
