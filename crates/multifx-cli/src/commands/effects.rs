//! Effect listing and information command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use multifx_core::{ParamInfo, ParamKind};
use multifx_engine::{EffectDescriptor, EffectRegistry};
use serde::Serialize;

#[derive(Args)]
pub struct EffectsArgs {
    /// Show details for a specific effect (key, name or type id)
    #[arg(value_name = "EFFECT")]
    effect: Option<String>,

    /// Print the catalogue as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct EffectJson {
    type_id: u8,
    key: &'static str,
    name: &'static str,
    short_name: &'static str,
    description: &'static str,
    category: &'static str,
    channels: &'static str,
    pool_capacity: usize,
    params: Vec<ParamJson>,
}

#[derive(Serialize)]
struct ParamJson {
    id: u8,
    key: String,
    name: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<f32>,
    unit: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<&'static str>,
}

impl From<&EffectDescriptor> for EffectJson {
    fn from(d: &EffectDescriptor) -> Self {
        Self {
            type_id: d.type_id,
            key: d.key,
            name: d.meta.name,
            short_name: d.meta.short_name,
            description: d.meta.description,
            category: d.category.name(),
            channels: d.channel_mode.label(),
            pool_capacity: d.pool_capacity,
            params: d.meta.params.iter().map(ParamJson::from).collect(),
        }
    }
}

impl From<&ParamInfo> for ParamJson {
    fn from(p: &ParamInfo) -> Self {
        let range = p.range();
        let options = match p.kind {
            ParamKind::Enum(options) => options.iter().map(|o| o.name).collect(),
            _ => Vec::new(),
        };
        Self {
            id: p.id,
            key: multifx_config::param_key(p.name),
            name: p.name,
            description: p.description,
            min: range.map(|r| r.min),
            max: range.map(|r| r.max),
            unit: p.unit.suffix().trim(),
            options,
        }
    }
}

fn find_effect(registry: &EffectRegistry, name: &str) -> Option<&'static EffectDescriptor> {
    match name.parse::<u8>() {
        Ok(type_id) => registry.get(type_id),
        Err(_) => registry.find(name),
    }
}

/// Human-readable value range of a parameter.
fn describe_range(param: &ParamInfo) -> String {
    match param.kind {
        ParamKind::Number(range) => {
            let suffix = param.unit.suffix();
            format!("{}{suffix} .. {}{suffix}", range.min, range.max)
        }
        ParamKind::Free => "0 .. 127".to_string(),
        ParamKind::Enum(options) => options
            .iter()
            .map(|o| o.name)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

pub fn run(args: EffectsArgs) -> anyhow::Result<()> {
    let registry = EffectRegistry::new();

    if let Some(effect_name) = &args.effect {
        let effect = find_effect(&registry, effect_name)
            .ok_or_else(|| anyhow::anyhow!("Unknown effect: {}", effect_name))?;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&EffectJson::from(effect))?);
            return Ok(());
        }

        let meta = effect.meta;
        println!("{} ({})", meta.name, effect.key);
        println!("{}", "=".repeat(meta.name.len() + effect.key.len() + 3));
        println!();
        println!("{}", meta.description);
        println!();
        println!(
            "Type id {}, {}, {} channels, {} pooled instances",
            effect.type_id,
            effect.category.name(),
            effect.channel_mode.label(),
            effect.pool_capacity
        );
        println!();

        println!("Parameters:");
        println!();
        println!("  {:3}  {:12}  {:40}  {}", "Id", "Key", "Description", "Range");
        println!("  {:3}  {:12}  {:40}  {}", "--", "---", "-----------", "-----");
        for param in meta.params {
            println!(
                "  {:3}  {:12}  {:40}  {}",
                param.id,
                multifx_config::param_key(param.name),
                param.description,
                describe_range(param)
            );
        }

        println!();
        println!("Values are 0..127 on the wire and in patch files, e.g.:");
        println!();
        println!("  [[slot]]");
        println!("  effect = \"{}\"", effect.key);
        if let Some(first) = meta.params.first() {
            println!("  [slot.params]");
            println!("  {} = 64", multifx_config::param_key(first.name));
        }
        return Ok(());
    }

    if args.json {
        let all: Vec<EffectJson> = registry.all_effects().iter().map(EffectJson::from).collect();
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }

    println!("Available Effects");
    println!("=================");
    println!();
    println!("  {:>3}  {:12}  {:12}  {}", "Id", "Key", "Category", "Description");
    for effect in registry.all_effects() {
        println!(
            "  {:>3}  {:12}  {:12}  {}",
            effect.type_id,
            effect.key,
            effect.category.name(),
            effect.meta.description
        );
    }
    println!();
    println!("Use 'multifx effects <key>' for parameter details.");

    Ok(())
}
