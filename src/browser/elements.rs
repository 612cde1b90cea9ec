//! Interactive element extraction
//!
//! Captures the currently visible interactive controls on a page as
//! [`Element`] value snapshots via an injected script.

use crate::error::{Error, Result};
use crate::state::{Element, ElementKind};
use chromiumoxide::Page;
use tracing::debug;

const EXTRACT_SCRIPT: &str = r#"
    (() => {
        const getSelector = (el) => {
            if (el.id) return `#${el.id}`;
            if (el.className && typeof el.className === 'string' && el.className.trim()) {
                return `${el.tagName.toLowerCase()}.${el.className.trim().split(/\s+/).join('.')}`;
            }
            return el.tagName.toLowerCase();
        };

        const interactives = Array.from(
            document.querySelectorAll('a, button, input, select, textarea, [role="button"]')
        );

        return interactives.map((el, index) => {
            const tag = el.tagName.toLowerCase();
            let kind;
            if (tag === 'a') kind = 'link';
            else if (tag === 'button') kind = 'button';
            else if (tag === 'input') kind = 'input';
            else if (tag === 'textarea') kind = 'textarea';
            else if (tag === 'select') kind = 'select';
            else kind = 'rolebutton';

            return {
                id: `el_${index}`,
                kind,
                inputType: el.type || null,
                text: el.innerText || el.value || el.placeholder || el.name || '',
                href: el.href || null,
                selector: getSelector(el),
                visible: el.offsetWidth > 0 && el.offsetHeight > 0
            };
        }).filter(el => el.visible);
    })()
"#;

/// Extract the visible interactive elements on the page.
///
/// Each result is a snapshot valid only for the page it was observed on.
pub async fn extract_interactive(page: &Page) -> Result<Vec<Element>> {
    let result: Vec<serde_json::Value> = page
        .evaluate(EXTRACT_SCRIPT)
        .await
        .map_err(|e| Error::cdp(e.to_string()))?
        .into_value()
        .map_err(|e| Error::cdp(e.to_string()))?;

    let elements: Vec<Element> = result
        .into_iter()
        .map(|v| {
            let kind = match v["kind"].as_str().unwrap_or("button") {
                "link" => ElementKind::Link,
                "input" => ElementKind::Input,
                "textarea" => ElementKind::TextArea,
                "select" => ElementKind::Select,
                "rolebutton" => ElementKind::RoleButton,
                _ => ElementKind::Button,
            };

            Element {
                id: v["id"].as_str().unwrap_or("").to_string(),
                kind,
                input_type: v["inputType"].as_str().map(String::from),
                text: v["text"].as_str().unwrap_or("").to_string(),
                href: v["href"].as_str().map(String::from),
                selector: v["selector"].as_str().unwrap_or("").to_string(),
                visible: v["visible"].as_bool().unwrap_or(false),
            }
        })
        .collect();

    debug!("Extracted {} interactive elements", elements.len());
    Ok(elements)
}
