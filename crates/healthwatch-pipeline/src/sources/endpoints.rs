//! Source endpoint URL builders
//!
//! Credentials and provider keys are percent-encoded; coordinates are
//! rendered with `f64`'s shortest round-trip formatting.

/// Current conditions in imperial units (temperature in °F).
pub fn current_conditions_url(base_url: &str, lat: f64, lon: f64, api_key: &str) -> String {
    format!(
        "{}/data/2.5/weather?lat={}&lon={}&appid={}&units=imperial",
        base_url.trim_end_matches('/'),
        lat,
        lon,
        urlencoding::encode(api_key)
    )
}

/// Current air-pollution index.
pub fn air_quality_url(base_url: &str, lat: f64, lon: f64, api_key: &str) -> String {
    format!(
        "{}/data/2.5/air_pollution?lat={}&lon={}&appid={}",
        base_url.trim_end_matches('/'),
        lat,
        lon,
        urlencoding::encode(api_key)
    )
}

/// One-day health indices (index group 1) for a provider location key.
pub fn lifestyle_index_url(base_url: &str, provider_key: &str, api_key: &str) -> String {
    format!(
        "{}/indices/v1/daily/1day/{}/groups/1?apikey={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(provider_key),
        urlencoding::encode(api_key)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_conditions_url() {
        assert_eq!(
            current_conditions_url("https://api.openweathermap.org", 21.3045, -157.8556, "k"),
            "https://api.openweathermap.org/data/2.5/weather?lat=21.3045&lon=-157.8556&appid=k&units=imperial"
        );
    }

    #[test]
    fn test_air_quality_url_trims_trailing_slash() {
        assert_eq!(
            air_quality_url("http://localhost:8080/", 40.7128, -74.006, "k"),
            "http://localhost:8080/data/2.5/air_pollution?lat=40.7128&lon=-74.006&appid=k"
        );
    }

    #[test]
    fn test_lifestyle_index_url_encodes_key() {
        assert_eq!(
            lifestyle_index_url("https://dataservice.accuweather.com", "347810", "a b&c"),
            "https://dataservice.accuweather.com/indices/v1/daily/1day/347810/groups/1?apikey=a%20b%26c"
        );
    }
}
