//! Plain-text and JSON rendering of skill library queries.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use skillbook_skills::search::extract_snippet;
use skillbook_skills::{
    to_prompt, tools_for_platform, SkillLoader, SkillRecord, SkillRegistry, SkillValidator,
};
use std::path::Path;

const SNIPPET_CONTEXT: usize = 40;

/// Filters accepted by `list`; the first one set wins.
#[derive(Debug, Default)]
pub struct ListFilter {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub platform: Option<String>,
    pub complexity: Option<String>,
}

/// How `load` renders a document.
#[derive(Debug)]
pub enum LoadView {
    Full,
    Json,
    Prompt,
    Section(String),
    Tools(String),
}

fn discover(root: &Path) -> Result<SkillRegistry> {
    SkillRegistry::discover_at(root)
        .with_context(|| format!("Failed to discover skills under {}", root.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn list(root: &Path, filter: &ListFilter, json: bool) -> Result<()> {
    let registry = discover(root)?;

    let skills = if let Some(category) = &filter.category {
        registry.find_by_category(category)
    } else if let Some(tag) = &filter.tag {
        registry.find_by_tag(tag)
    } else if let Some(platform) = &filter.platform {
        registry.find_by_platform(platform)
    } else if let Some(complexity) = &filter.complexity {
        registry.find_by_complexity(complexity)
    } else {
        registry.get_all()
    };

    if json {
        return print_json(&skills);
    }

    // Group by category, keeping first-seen order.
    let mut groups: Vec<(&str, Vec<&SkillRecord>)> = Vec::new();
    for skill in skills.iter().copied() {
        match groups.iter_mut().find(|(c, _)| *c == skill.category()) {
            Some((_, members)) => members.push(skill),
            None => groups.push((skill.category(), vec![skill])),
        }
    }

    for (category, members) in groups {
        println!("\n{}", category.to_uppercase());
        for skill in members {
            println!(
                "  [{}] {} - {}",
                skill.complexity, skill.name, skill.description
            );
            println!(
                "     Path: {} | Tags: {}",
                skill.path,
                skill.tags.join(", ")
            );
        }
    }
    println!("\nTotal: {} skills", skills.len());
    Ok(())
}

pub fn search(root: &Path, query: &str, json: bool) -> Result<()> {
    let registry = discover(root)?;
    let results = registry.search(query);

    if json {
        return print_json(&results);
    }

    if results.is_empty() {
        println!("No skills found matching \"{}\"", query);
        return Ok(());
    }

    println!("Search results for \"{}\":\n", query);
    for skill in results {
        let description = extract_snippet(&skill.description, query, SNIPPET_CONTEXT)
            .unwrap_or_else(|| skill.description.clone());
        println!("  {}", skill.path);
        println!("     {}", description);
        println!("     Tags: {}\n", skill.tags.join(", "));
    }
    Ok(())
}

pub fn load(root: &Path, path: &str, view: LoadView) -> Result<()> {
    let document = SkillLoader::new(root).load(path)?;

    match view {
        LoadView::Json => print_json(&document)?,
        LoadView::Prompt => println!("{}", to_prompt(&document)),
        LoadView::Section(name) => {
            println!("{}", document.section(&name).unwrap_or(document.raw_body.as_str()));
        }
        LoadView::Tools(platform) => {
            for tool in tools_for_platform(&document, &platform) {
                println!("{}", tool);
            }
        }
        LoadView::Full => {
            let record = &document.record;
            println!("# {} v{}\n", record.name, record.version);
            println!("{}", record.description);
            println!("\nAuthor: {}", record.author);
            println!("Category: {}", record.category());
            println!("Complexity: {}", record.complexity);
            println!("Tags: {}", record.tags.join(", "));
            println!("Platforms: {}", join_display(&record.platforms));

            if !record.tools.is_empty() {
                println!("\nTools:");
                for (kind, tools) in record.tools.iter() {
                    println!("  {}: {}", kind, tools.join(", "));
                }
            }

            println!("\n## Procedure\n");
            if document.procedure.is_empty() {
                println!("{}", document.raw_body);
            } else {
                println!("{}", document.procedure);
            }
        }
    }
    Ok(())
}

fn join_display<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn info(root: &Path, path: &str) -> Result<()> {
    let registry = discover(root)?;
    let Some(skill) = registry.get(path) else {
        bail!("Skill not found: {}", path);
    };

    println!("{}\n", skill.name);
    println!("Description: {}", skill.description);
    println!("Version:     {}", skill.version);
    println!("Author:      {}", skill.author);
    println!("Category:    {}", skill.category());
    println!("Complexity:  {}", skill.complexity);
    println!("Tags:        {}", skill.tags.join(", "));
    println!("Platforms:   {}", join_display(&skill.platforms));
    Ok(())
}

pub fn validate(root: &Path, path: Option<&str>) -> Result<()> {
    let validator = SkillValidator::new();

    let Some(path) = path else {
        let reports = validator.validate_all(root)?;
        let mut valid = 0;
        for report in &reports {
            if report.valid {
                valid += 1;
                println!("ok    {}", report.path);
            } else {
                println!("FAIL  {}", report.path);
                for error in &report.errors {
                    println!("      {}", error);
                }
            }
        }
        println!("\n{} valid, {} invalid", valid, reports.len() - valid);
        return Ok(());
    };

    let report = validator.validate_path(root, path)?;

    println!("{}: {}", report.path, report.summary);
    for error in &report.errors {
        println!("  error: {}", error);
    }
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }
    Ok(())
}

pub fn stats(root: &Path, json: bool) -> Result<()> {
    let registry = discover(root)?;
    let stats = registry.stats();

    if json {
        return print_json(&stats);
    }

    println!("Total Skills:  {}", stats.total_skills);
    println!("Categories:    {}", stats.categories);
    println!("Unique Tags:   {}", stats.tags);
    println!("Platforms:     {}", stats.platforms);
    if let Some(discovered_at) = stats.discovered_at {
        println!("Indexed at:    {}", discovered_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    println!("\nBy Category:");
    for (category, count) in &stats.by_category {
        println!("  {}: {}", category, count);
    }

    println!("\nBy Complexity:");
    for (complexity, count) in &stats.by_complexity {
        println!("  {}: {}", complexity, count);
    }
    Ok(())
}

pub fn categories(root: &Path) -> Result<()> {
    let registry = discover(root)?;
    for category in registry.categories() {
        println!("{}", category);
    }
    Ok(())
}

pub fn tags(root: &Path) -> Result<()> {
    let registry = discover(root)?;
    println!("{}", registry.tags().join(", "));
    Ok(())
}
