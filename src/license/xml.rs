//! XML license definitions.
//!
//! ```xml
//! <header-checkr>
//!   <families>
//!     <family id="MIT" name="The MIT License"/>
//!   </families>
//!   <licenses>
//!     <license id="MIT" family="MIT" name="The MIT License">
//!       <notes>optional</notes>
//!       <any>
//!         <text>Licensed under the MIT License</text>
//!         <spdx name="MIT"/>
//!       </any>
//!     </license>
//!     <license id="MIT-0" family="MIT" derived-from="MIT">
//!       <license_ref refid="MIT"/>
//!     </license>
//!   </licenses>
//!   <approved>
//!     <family ref="MIT"/>
//!     <license ref="Apache-2.0"/>
//!   </approved>
//! </header-checkr>
//! ```

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ConfigError;

use super::{Definitions, FamilySpec, LicenseSpec, MatcherExpr};

const ROOT: &str = "header-checkr";

/// Built-in license definitions.
const DEFAULT_XML: &str = include_str!("default.xml");

pub fn default_definitions() -> Result<Definitions, ConfigError> {
    read_definitions(DEFAULT_XML, "<built-in>")
}

pub fn read_definitions_file(path: &Path) -> Result<Definitions, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_definitions(&content, &path.display().to_string())
}

/// Parse a definitions document. `origin` names the source in errors.
pub fn read_definitions(xml: &str, origin: &str) -> Result<Definitions, ConfigError> {
    let root = parse_tree(xml, origin)?;
    if root.name != ROOT {
        return Err(xml_error(
            origin,
            format!("expected <{}> root element, found <{}>", ROOT, root.name),
        ));
    }

    let mut definitions = Definitions::default();
    for section in &root.children {
        match section.name.as_str() {
            "families" => {
                for family in section.children_named("family") {
                    definitions.families.push(FamilySpec {
                        id: family.required_attr("id", origin)?.to_string(),
                        name: family.required_attr("name", origin)?.to_string(),
                    });
                }
            }
            "licenses" => {
                for license in section.children_named("license") {
                    definitions.licenses.push(read_license(license, origin)?);
                }
            }
            "approved" => {
                for entry in &section.children {
                    let reference = entry.required_attr("ref", origin)?.to_string();
                    match entry.name.as_str() {
                        "family" => definitions.approved_families.push(reference),
                        "license" => definitions.approved_licenses.push(reference),
                        other => {
                            return Err(xml_error(origin, format!("unexpected <{}> in <approved>", other)));
                        }
                    }
                }
            }
            other => return Err(xml_error(origin, format!("unexpected section <{}>", other))),
        }
    }
    Ok(definitions)
}

fn read_license(element: &Element, origin: &str) -> Result<LicenseSpec, ConfigError> {
    let id = element.required_attr("id", origin)?;
    let family = element.attr("family").ok_or_else(|| ConfigError::MissingField {
        context: format!("license '{}'", id),
        field: "family",
    })?;

    let mut notes = element.attr("notes").map(str::to_string);
    let mut matchers = Vec::new();
    for child in &element.children {
        if child.name == "notes" || child.name == "note" {
            notes = Some(child.text.clone());
        } else {
            matchers.push(read_matcher(child)?);
        }
    }

    if matchers.len() > 1 {
        return Err(xml_error(
            origin,
            format!("license '{}' must enclose exactly one matcher, found {}", id, matchers.len()),
        ));
    }
    let matcher = matchers.pop().ok_or_else(|| ConfigError::MissingField {
        context: format!("license '{}'", id),
        field: "matcher",
    })?;

    Ok(LicenseSpec {
        id: id.to_string(),
        family: family.to_string(),
        name: element.attr("name").map(str::to_string),
        notes,
        derived_from: element.attr("derived-from").map(str::to_string),
        matcher,
    })
}

fn read_matcher(element: &Element) -> Result<MatcherExpr, ConfigError> {
    let expr = match element.name.as_str() {
        "text" => MatcherExpr::Text {
            text: element.text.clone(),
        },
        "regex" => MatcherExpr::Regex {
            pattern: element
                .attr("expr")
                .map(str::to_string)
                .unwrap_or_else(|| element.text.clone()),
        },
        "copyright" => MatcherExpr::Copyright {
            start: element.attr("start").map(str::to_string),
            stop: element.attr("end").or_else(|| element.attr("stop")).map(str::to_string),
            owner: element.attr("owner").map(str::to_string),
        },
        "spdx" => MatcherExpr::Spdx {
            name: element.attr("name").unwrap_or_default().to_string(),
        },
        "license_ref" => MatcherExpr::LicenseRef {
            id: element
                .attr("refid")
                .or_else(|| element.attr("ref"))
                .unwrap_or_default()
                .to_string(),
        },
        "any" => MatcherExpr::Any {
            matchers: read_children(element)?,
        },
        "all" => MatcherExpr::All {
            matchers: read_children(element)?,
        },
        "not" => {
            let mut children = read_children(element)?;
            if children.len() != 1 {
                return Err(ConfigError::InvalidMatcher {
                    kind: "not".to_string(),
                    reason: format!("exactly one enclosed matcher is required, found {}", children.len()),
                });
            }
            let child = children.remove(0);
            MatcherExpr::Not {
                matcher: Box::new(child),
            }
        }
        other => {
            return Err(ConfigError::InvalidMatcher {
                kind: other.to_string(),
                reason: "unknown matcher type".to_string(),
            })
        }
    };
    Ok(expr)
}

fn read_children(element: &Element) -> Result<Vec<MatcherExpr>, ConfigError> {
    element.children.iter().map(read_matcher).collect()
}

fn xml_error(origin: &str, reason: impl Display) -> ConfigError {
    ConfigError::Xml {
        origin: origin.to_string(),
        reason: reason.to_string(),
    }
}

/// Minimal element tree; definitions files are small.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: BTreeMap<String, String>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    fn required_attr(&self, key: &'static str, origin: &str) -> Result<&str, ConfigError> {
        match self.attr(key) {
            Some(value) if !value.trim().is_empty() => Ok(value.trim()),
            _ => Err(ConfigError::MissingField {
                context: format!("<{}> in {}", self.name, origin),
                field: key,
            }),
        }
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn start_element(e: &BytesStart<'_>, origin: &str) -> Result<Element, ConfigError> {
    let mut element = Element {
        name: String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned(),
        ..Element::default()
    };
    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_error(origin, err))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|err| xml_error(origin, err))?;
        element.attributes.insert(key, value.into_owned());
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element, origin: &str) -> Result<(), ConfigError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(xml_error(origin, "more than one root element"))
    }
}

fn parse_tree(xml: &str, origin: &str) -> Result<Element, ConfigError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => stack.push(start_element(e, origin)?),
            Ok(Event::Empty(ref e)) => {
                let element = start_element(e, origin)?;
                attach(&mut stack, &mut root, element, origin)?;
            }
            Ok(Event::End(_)) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element, origin)?;
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(top) = stack.last_mut() {
                    let text = e.unescape().map_err(|err| xml_error(origin, err))?;
                    top.text.push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(xml_error(
                    origin,
                    format!("at position {}: {}", reader.buffer_position(), err),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(xml_error(origin, format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| xml_error(origin, "no root element"))
}
