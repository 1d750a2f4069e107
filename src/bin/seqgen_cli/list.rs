//! Catalog listing command.

use anyhow::{anyhow, Result};
use clap::Parser;
use serde::Serialize;

use seqgen::demo::demo_catalog;
use seqgen_types::{Catalog, TypeInfo};

#[derive(Parser, Debug)]
#[command(about = "List the types and operations of the catalog")]
pub struct ListCmd {
    /// Only show this type
    pub type_name: Option<String>,
}

#[derive(Serialize)]
struct TypeListing {
    name: String,
    supertypes: Vec<String>,
    is_final: bool,
    is_abstract: bool,
    constructors: Vec<String>,
    methods: Vec<String>,
}

impl From<&TypeInfo> for TypeListing {
    fn from(info: &TypeInfo) -> Self {
        Self {
            name: info.name.clone(),
            supertypes: info.supertypes.clone(),
            is_final: info.is_final,
            is_abstract: info.is_abstract,
            constructors: info.public_constructors().map(|op| op.desc().to_string()).collect(),
            methods: info.public_methods().map(|op| op.desc().to_string()).collect(),
        }
    }
}

impl ListCmd {
    pub fn execute(&self, json_output: bool) -> Result<()> {
        let catalog = demo_catalog();
        let names = match &self.type_name {
            Some(name) => {
                if catalog.type_info(name).is_none() {
                    return Err(anyhow!("Type '{}' not found in the catalog", name));
                }
                vec![name.clone()]
            }
            None => catalog.type_names(),
        };
        let listings: Vec<TypeListing> = names
            .iter()
            .filter_map(|name| catalog.type_info(name))
            .map(TypeListing::from)
            .collect();

        if json_output {
            println!("{}", serde_json::to_string_pretty(&listings)?);
            return Ok(());
        }

        for listing in &listings {
            let mut flags = Vec::new();
            if listing.is_abstract {
                flags.push("abstract");
            }
            if listing.is_final {
                flags.push("final");
            }
            let extends = if listing.supertypes.is_empty() {
                String::new()
            } else {
                format!(" : {}", listing.supertypes.join(", "))
            };
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };
            println!("{}{}{}", listing.name, extends, flags);
            for ctor in &listing.constructors {
                println!("  {ctor}");
            }
            for method in &listing.methods {
                println!("  {method}");
            }
        }
        Ok(())
    }
}
