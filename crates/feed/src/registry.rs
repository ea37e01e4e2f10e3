use serde::{Deserialize, Serialize};

/// A selectable, named feed endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpec {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Endpoints known out of the box. Hosts may select one by id or configure
/// an explicit URL instead.
pub fn builtin_sources() -> Vec<SourceSpec> {
    vec![
        SourceSpec {
            id: "usgs-all-day".to_string(),
            name: "USGS (live, last 24h)".to_string(),
            url: "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_day.geojson"
                .to_string(),
        },
        SourceSpec {
            id: "usgs-all-week".to_string(),
            name: "USGS (live, last 7 days)".to_string(),
            url: "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson"
                .to_string(),
        },
    ]
}

pub fn find_source<'a>(sources: &'a [SourceSpec], id: &str) -> Option<&'a SourceSpec> {
    sources.iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::{builtin_sources, find_source};

    #[test]
    fn builtin_ids_are_unique_and_resolvable() {
        let sources = builtin_sources();
        for spec in &sources {
            assert_eq!(find_source(&sources, &spec.id).unwrap().id, spec.id);
        }
        assert!(find_source(&sources, "nope").is_none());
    }
}
