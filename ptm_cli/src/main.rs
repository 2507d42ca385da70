//! # PTM CLI Application
//!
//! Interactive coating estimate for a single profile.
//!
//! ```text
//! ptm_cli [catalogue.json] [materials.json] [settings.json]
//! ```
//!
//! Without arguments the built-in sample catalogue and coating table are
//! used. Set `RUST_LOG=debug` to see lookup decisions.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use ptm_core::calculations::{estimate_row, format_or_dash, Quantity, QuantityUnit, RowInput};
use ptm_core::exposure::{segment_count, Exposure, ExposureMask};
use ptm_core::samples::{builtin_sample_catalogue, builtin_sample_materials};
use ptm_core::{CalcError, EngineSettings, MaterialDb, ShapeCatalogue, ShapeKind};
use tracing_subscriber::EnvFilter;

fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    io::stdout().flush().ok()?;

    let mut input = String::new();
    match io::stdin().lock().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}

/// Number typed by a person: decimal comma accepted, blank means none
fn parse_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_unit(text: &str) -> Option<QuantityUnit> {
    match text.trim().to_lowercase().as_str() {
        "" | "m" | "м" => Some(QuantityUnit::Meters),
        "t" | "т" => Some(QuantityUnit::Tonnes),
        _ => None,
    }
}

/// `all` (or blank) for a fully exposed outline, otherwise the exposed
/// segment indices separated by commas or spaces.
fn parse_exposure(text: &str, segments: usize) -> Result<Exposure, String> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("all") {
        return Ok(Exposure::Full);
    }

    let mut bits = 0u32;
    for token in text.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
        let index: usize = token
            .parse()
            .map_err(|_| format!("'{}' is not a segment number", token))?;
        if index >= segments {
            return Err(format!("segment {} is out of range 0..{}", index, segments - 1));
        }
        bits |= 1 << index;
    }
    ExposureMask::from_bits(bits, segments)
        .map(Exposure::Mask)
        .map_err(|e| e.to_string())
}

/// Pick from a list by number (1-based) or by exact name
fn choose<'a>(title: &str, options: &[&'a str]) -> Option<&'a str> {
    if options.is_empty() {
        println!("No {} available.", title);
        return None;
    }
    println!("{}:", title);
    for (i, option) in options.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, option);
    }
    let answer = read_line(&format!("Select {} [1]: ", title))?;
    if answer.is_empty() {
        return options.first().copied();
    }
    if let Ok(n) = answer.parse::<usize>() {
        return options.get(n.wrapping_sub(1)).copied();
    }
    options.iter().copied().find(|o| *o == answer)
}

fn report_error(error: &CalcError) {
    eprintln!("Error: {}", error);
    if let Ok(json) = serde_json::to_string_pretty(error) {
        eprintln!();
        eprintln!("Error JSON:");
        eprintln!("{}", json);
    }
}

fn load_inputs(args: &[String]) -> Result<(ShapeCatalogue, MaterialDb, EngineSettings), CalcError> {
    let catalogue = match args.first() {
        Some(path) => ShapeCatalogue::load_from_json(path)?,
        None => builtin_sample_catalogue().clone(),
    };
    let materials = match args.get(1) {
        Some(path) => MaterialDb::load_from_json(path)?,
        None => builtin_sample_materials().clone(),
    };
    let settings = match args.get(2) {
        Some(path) => EngineSettings::load_from_json(path)?,
        None => EngineSettings::default(),
    };
    Ok((catalogue, materials, settings))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (catalogue, materials, settings) = match load_inputs(&args) {
        Ok(inputs) => inputs,
        Err(e) => {
            report_error(&e);
            return ExitCode::FAILURE;
        }
    };

    println!("PTM CLI - Fire-Protection Coating Calculator");
    println!("============================================");
    println!();

    let Some(family) = choose("family", &catalogue.families()) else {
        return ExitCode::FAILURE;
    };
    let Some(standard) = choose("standard", &catalogue.standards_for(family)) else {
        return ExitCode::FAILURE;
    };

    let pattern = read_line("Profile name filter (blank for all): ").unwrap_or_default();
    let found = catalogue.search(family, standard, &pattern);
    let names: Vec<&str> = found.iter().map(|item| item.name.as_str()).collect();
    let Some(name) = choose("profile", &names) else {
        return ExitCode::FAILURE;
    };
    let item = match catalogue.find(family, standard, name) {
        Ok(item) => item.clone(),
        Err(e) => {
            report_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let kind = item.kind();
    let mut input = RowInput::new(format!("{} {}", standard, name), item);

    match segment_count(kind, settings.circle_segments) {
        Some(segments) => {
            let answer = read_line(&format!(
                "Exposed segments 0..{} ('all' or list) [all]: ",
                segments - 1
            ))
            .unwrap_or_default();
            match parse_exposure(&answer, segments) {
                Ok(exposure) => input = input.with_exposure(exposure),
                Err(msg) => {
                    eprintln!("Error: {}", msg);
                    return ExitCode::FAILURE;
                }
            }
        }
        None => {
            println!("'{}' has no outline; enter the heated perimeter by hand.", kind.display_name());
        }
    }

    let perimeter_prompt = if kind == ShapeKind::Custom {
        "Heated perimeter (cm): "
    } else {
        "Heated perimeter override (cm, blank for computed): "
    };
    if let Some(p) = read_line(perimeter_prompt).as_deref().and_then(parse_decimal) {
        input = input.with_manual_perimeter(p);
    }

    let material_id = settings.default_material.clone();
    if let Ok(table) = materials.get(&material_id) {
        let labels: Vec<String> = table.ratings().iter().map(|r| r.label()).collect();
        println!("Ratings in '{}': {}", material_id, labels.join(", "));
    }
    if let Some(rating) = read_line("Fire rating (e.g. R60, blank for none): ").filter(|r| !r.is_empty()) {
        input = input.with_rating(rating);
    }
    if let Some(t) = read_line("Manual coating thickness (mm, blank for none): ")
        .as_deref()
        .and_then(parse_decimal)
    {
        input = input.with_manual_thickness(t);
    }

    if let Some(qty) = read_line("Quantity [0]: ").as_deref().and_then(parse_decimal) {
        let Some(unit) = read_line("Unit, m or t [m]: ").as_deref().and_then(parse_unit) else {
            eprintln!("Error: unit must be 'm' or 't'");
            return ExitCode::FAILURE;
        };
        input = input.with_quantity(match unit {
            QuantityUnit::Meters => Quantity::meters(qty),
            QuantityUnit::Tonnes => Quantity::tonnes(qty),
        });
    }

    let result = match estimate_row(&input, &materials, &settings) {
        Ok(result) => result,
        Err(e) => {
            report_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let p = settings.precision;
    println!();
    println!("═══════════════════════════════════════");
    println!("  COATING ESTIMATE: {}", result.label);
    println!("═══════════════════════════════════════");
    println!();
    println!("Section:");
    println!("  Kind:          {}", result.kind.display_name());
    println!("  Area:          {} cm²", format_or_dash(result.area_cm2, p.area));
    println!(
        "  Perimeter:     {} cm{}",
        format_or_dash(result.perimeter_cm, 2),
        if result.perimeter_is_manual { " (manual)" } else { "" }
    );
    println!("  Reduced t:     {} mm", format_or_dash(result.reduced_thickness_mm, p.reduced_thickness));
    println!("  Surface:       {} m²/m", format_or_dash(result.surface_per_meter_m2, p.surface_per_meter));
    println!("  Surface:       {} m²/t", format_or_dash(result.surface_per_tonne_m2, p.surface_per_tonne));
    println!();
    println!("Coating:");
    match (&result.table_match, &result.lookup_miss) {
        (Some(hit), _) => println!("  Source:        table, breakpoint {}", hit.breakpoint_key),
        (None, Some(miss)) => println!("  Source:        manual ({})", miss),
        (None, None) => println!("  Source:        manual"),
    }
    println!("  Thickness:     {} mm", format_or_dash(result.thickness_mm, p.thickness));
    println!("  Consumption:   {} kg/m²", format_or_dash(result.consumption_kg_m2, p.consumption));
    println!("  Total:         {} kg", format_or_dash(result.total_kg, p.total));
    println!("═══════════════════════════════════════");

    println!();
    println!("JSON Output:");
    match serde_json::to_string_pretty(&result.rounded(&p)) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::warn!(error = %e, "result not serializable"),
    }

    ExitCode::SUCCESS
}
