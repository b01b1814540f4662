use schemars::schema_for;

use super::listing::StructuredListing;

const PREAMBLE: &str = "\
You extract structured data from the text of a Dutch real-estate listing on funda.nl.
Answer with exactly one JSON object and nothing else: no explanation, no code fences.
Use the keys and value types of the JSON schema below. Write numbers as plain numbers
without currency symbols, units or thousands separators. Write yes/no facts as true or
false. Use null for anything the listing does not state; never guess a value.";

/// The instruction sent with every extraction request
///
/// Built from the `StructuredListing` schema, so the model is always asked for
/// exactly the attributes that get stored.
pub fn default_instruction() -> String {
    let schema = schema_for!(StructuredListing);
    let schema = serde_json::to_string_pretty(&schema).unwrap_or_default();
    format!("{PREAMBLE}\n\nJSON schema:\n{schema}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::listing::LISTING_FIELDS;

    #[test]
    fn test_instruction_names_every_attribute() {
        let instruction = default_instruction();
        for (name, _) in LISTING_FIELDS {
            assert!(instruction.contains(&format!("\"{name}\"")), "{name} missing");
        }
        assert!(instruction.contains("Vraagprijs"));
    }
}
