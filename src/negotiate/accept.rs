//! `Accept` header matching.
//!
//! Each supported type is scored against every media range in the header:
//! an exact type match is worth 100, an exact subtype match 10, and each
//! matching parameter 1 (`q` excluded). The best-scoring range supplies the
//! quality for that type. The supported type with the highest quality wins,
//! then the highest score, then the earliest in the supported list. A
//! winning quality of 0 means nothing is acceptable.
//!
//! An empty header accepts anything (`*/*`).

/// A parsed media range such as `text/html;level=1;q=0.5`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    pub main_type: String,
    pub sub_type: String,
    pub params: Vec<(String, String)>,
    pub quality: f32,
}

impl MediaRange {
    /// Parse one media range. Returns `None` when there is no `type/subtype`.
    pub fn parse(range: &str) -> Option<Self> {
        let mut parts = range.split(';');
        let full_type = parts.next()?.trim();
        let full_type = if full_type == "*" { "*/*" } else { full_type };
        let (main_type, sub_type) = full_type.split_once('/')?;
        let (main_type, sub_type) = (main_type.trim(), sub_type.trim());
        if main_type.is_empty() || sub_type.is_empty() {
            return None;
        }

        let params: Vec<(String, String)> = parts
            .filter_map(|param| {
                let (key, value) = param.split_once('=')?;
                Some((
                    key.trim().to_ascii_lowercase(),
                    value.trim().trim_matches('"').to_string(),
                ))
            })
            .collect();

        let quality = params
            .iter()
            .find(|(key, _)| key == "q")
            .and_then(|(_, value)| value.parse::<f32>().ok())
            .filter(|q| (0.0..=1.0).contains(q))
            .unwrap_or(1.0);

        Some(Self {
            main_type: main_type.to_ascii_lowercase(),
            sub_type: sub_type.to_ascii_lowercase(),
            params,
            quality,
        })
    }

    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse a whole `Accept` header, skipping unparseable ranges.
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    let header = if header.trim().is_empty() { "*/*" } else { header };
    header.split(',').filter_map(MediaRange::parse).collect()
}

/// Score `mime_type` against `ranges`: `(fitness, quality)`, or `None` if no
/// range matches.
pub fn fitness_and_quality(mime_type: &str, ranges: &[MediaRange]) -> Option<(u32, f32)> {
    let target = MediaRange::parse(mime_type)?;
    let mut best: Option<(u32, f32)> = None;

    for range in ranges {
        let type_match = range.main_type == target.main_type
            || range.main_type == "*"
            || target.main_type == "*";
        let subtype_match = range.sub_type == target.sub_type
            || range.sub_type == "*"
            || target.sub_type == "*";
        if !(type_match && subtype_match) {
            continue;
        }

        let param_matches = target
            .params
            .iter()
            .filter(|(key, value)| key != "q" && range.param(key) == Some(value.as_str()))
            .count() as u32;

        let mut fitness = param_matches;
        if range.main_type == target.main_type {
            fitness += 100;
        }
        if range.sub_type == target.sub_type {
            fitness += 10;
        }

        if best.map_or(true, |(best_fitness, _)| fitness > best_fitness) {
            best = Some((fitness, range.quality));
        }
    }

    best
}

/// Pick the supported type that best satisfies `header`.
pub fn best_match<'a, S: AsRef<str>>(supported: &'a [S], header: &str) -> Option<&'a str> {
    let ranges = parse_accept(header);
    let mut winner: Option<(&str, f32, u32)> = None;

    for mime_type in supported {
        let mime_type = mime_type.as_ref();
        let Some((fitness, quality)) = fitness_and_quality(mime_type, &ranges) else {
            continue;
        };
        let better = match winner {
            None => true,
            Some((_, best_q, best_fitness)) => {
                quality > best_q || (quality == best_q && fitness > best_fitness)
            }
        };
        if better {
            winner = Some((mime_type, quality, fitness));
        }
    }

    winner
        .filter(|(_, quality, _)| *quality > 0.0)
        .map(|(mime_type, _, _)| mime_type)
}
