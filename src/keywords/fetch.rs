use aboutme_wire::{flat_sentinel, placeholder_layers, Endpoint, LAYER_COUNT};
use tracing::{debug, warn};

use super::client::{KeywordError, KeywordSource};

/// One flat-mode request. Errors come back as-is.
pub async fn try_fetch_keywords(
    source: &dyn KeywordSource,
    image: &str,
) -> Result<Vec<String>, KeywordError> {
    source.request(Endpoint::Flat, image, None).await
}

/// Keywords to display for a flat result: any failure becomes the `["Error"]` list.
pub fn flat_or_sentinel(result: Result<Vec<String>, KeywordError>) -> Vec<String> {
    match result {
        Ok(keywords) => keywords,
        Err(e) => {
            warn!(error = %e, "keyword fetch failed");
            flat_sentinel()
        }
    }
}

/// Result of one layered chain.
#[derive(Debug)]
pub enum LayerOutcome {
    Complete([Vec<String>; LAYER_COUNT]),
    /// The chain stopped at `layer`; nothing after it was requested.
    Failed { layer: usize, error: KeywordError },
}

impl LayerOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, LayerOutcome::Complete(_))
    }

    /// Layers to display: the fetched ones, or the placeholders on failure.
    pub fn layers(&self) -> [Vec<String>; LAYER_COUNT] {
        match self {
            LayerOutcome::Complete(layers) => layers.clone(),
            LayerOutcome::Failed { .. } => placeholder_layers(),
        }
    }
}

/// Run the four-step layered chain for one image.
///
/// Steps are strictly sequential: the first goes out with no keywords and
/// each later step is seeded with the previous step's result. `on_layer`
/// sees each layer as soon as it arrives.
pub async fn fetch_layers<F>(source: &dyn KeywordSource, image: &str, mut on_layer: F) -> LayerOutcome
where
    F: FnMut(usize, &[String]),
{
    let mut layers: [Vec<String>; LAYER_COUNT] = Default::default();

    for index in 0..LAYER_COUNT {
        let seed = match index {
            0 => None,
            _ => Some(layers[index - 1].as_slice()),
        };
        let result = source.request(Endpoint::Layered, image, seed).await;
        match result {
            Ok(keywords) => {
                debug!(layer = index, count = keywords.len(), "layer fetched");
                on_layer(index, &keywords);
                layers[index] = keywords;
            }
            Err(error) => {
                warn!(layer = index, error = %error, "layered fetch failed");
                return LayerOutcome::Failed { layer: index, error };
            }
        }
    }

    LayerOutcome::Complete(layers)
}
