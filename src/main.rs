use anyhow::{Context, Result};
use solar_calculator::{Calculator, DisplayFigures};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    solar_core::init()?;

    let app = solar_core::App::new()?;
    let mut calculator =
        Calculator::from_config(app.config()).context("Failed to set up calculator")?;

    tracing::info!("Solar calculator started");

    println!("Solar Energy Calculator");
    println!(
        "  Prediction service: {}",
        app.config().services.prediction_api_url
    );

    if let Err(failure) = calculator.use_current_location().await {
        println!("{}", failure);
        let Some(place) = app.config().location.fallback_place.as_ref() else {
            println!(
                "Set city and country under [location.fallback_place] in the config file \
                 to look up a place instead."
            );
            return Ok(());
        };
        if let Err(failure) = calculator.search_place(&place.city, &place.country).await {
            println!("{}", failure);
            return Ok(());
        }
    }

    if let Some(label) = calculator.session().location_label() {
        println!("Location: {}", label);
    }

    match calculator.submit().await {
        Ok(_) => {
            if let Some(figures) = calculator.figures() {
                print_figures(&figures);
            }
        }
        Err(failure) => println!("{}", failure),
    }

    Ok(())
}

fn print_figures(figures: &DisplayFigures) {
    println!();
    println!("  Daily energy:     {} kWh", figures.daily_energy);
    println!("  Solar irradiance: {} kWh/m²/day", figures.irradiance);
    println!("  Wind speed:       {} m/s", figures.wind_speed);
    println!("  Temperature:      {}°C", figures.temperature);
    println!("  Air quality:      AQI {} ({})", figures.aqi, figures.aqi_category);
    println!("  CO₂ offset:       {} kg CO₂", figures.co2_offset);
    println!("  Annual savings:   {}", figures.annual_savings_text);
    println!("  {}", figures.efficiency_badge);
}
