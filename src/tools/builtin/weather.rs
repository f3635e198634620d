use crate::tools::args::TemperatureUnit;

// Placeholder conditions until a real weather API is wired in.
const CONDITION: &str = "Partly cloudy";
const HUMIDITY: &str = "65%";
const WIND: &str = "10 km/h";

pub fn current_weather(location: &str, unit: TemperatureUnit) -> String {
    let (temperature, marker) = match unit {
        TemperatureUnit::Celsius => (22, "°C"),
        TemperatureUnit::Fahrenheit => (72, "°F"),
    };
    format!(
        "Current weather in {location}: {temperature}{marker}, {CONDITION}, Humidity: {HUMIDITY}, Wind: {WIND}"
    )
}
