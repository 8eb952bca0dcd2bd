// Element tree traversal with variable expansion and Ifdef/Else/Repeat constructs

use super::element::Element;
use super::error::SyntaxError;
use std::collections::HashMap;

/// Walks element children in document order, resolving control constructs.
///
/// The traversor holds no cursor state: every `traverse` call is
/// independent, so a visitor may start a nested traversal over another
/// subtree while an outer one is in progress.
#[derive(Debug, Clone, Default)]
pub struct ElementTreeTraversor {
    variables: HashMap<String, String>,
}

/// Variables visible at one point of a traversal: the globals plus the
/// bindings introduced by enclosing `Repeat` elements.
struct Scope<'a> {
    globals: &'a HashMap<String, String>,
    locals: Vec<(String, String)>,
}

impl<'a> Scope<'a> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.locals
            .iter()
            .rev()
            .find(|(local, _)| local == name)
            .map(|(_, value)| value.as_str())
            .or_else(|| self.globals.get(name).map(String::as_str))
    }

    fn lookup_local(&self, name: &str) -> Option<&str> {
        self.locals
            .iter()
            .rev()
            .find(|(local, _)| local == name)
            .map(|(_, value)| value.as_str())
    }

    fn with_binding(&self, name: &str, value: String) -> Scope<'a> {
        let mut locals = self.locals.clone();
        locals.push((name.to_string(), value));
        Scope {
            globals: self.globals,
            locals,
        }
    }
}

impl ElementTreeTraversor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Expands `${name}` references in `text` using the global variables
    pub fn expand(&self, text: &str) -> Result<String, SyntaxError> {
        substitute(text, |name| self.variables.get(name).map(String::as_str), true)
    }

    /// Invokes `visitor` once per resolved child of `parent`, in document order.
    pub fn traverse<F>(&self, parent: &Element, visitor: &mut F) -> Result<(), SyntaxError>
    where
        F: FnMut(&Element) -> Result<(), SyntaxError>,
    {
        let scope = Scope {
            globals: &self.variables,
            locals: Vec::new(),
        };
        traverse_children(parent, &scope, visitor)
    }
}

fn traverse_children<F>(parent: &Element, scope: &Scope<'_>, visitor: &mut F) -> Result<(), SyntaxError>
where
    F: FnMut(&Element) -> Result<(), SyntaxError>,
{
    // Outcome of the previous sibling when it was an Ifdef
    let mut last_condition: Option<bool> = None;
    for child in parent.children() {
        match child.name() {
            "Ifdef" => {
                let var = required_attribute(child, "var", scope)?;
                let taken = scope.lookup(&var).is_some();
                if taken {
                    traverse_children(child, scope, visitor)?;
                }
                last_condition = Some(taken);
                continue;
            }
            "Else" => {
                match last_condition.take() {
                    Some(false) => traverse_children(child, scope, visitor)?,
                    Some(true) => {}
                    None => return Err(SyntaxError::DanglingElse),
                }
                continue;
            }
            "Repeat" => {
                let count_text = required_attribute(child, "count", scope)?;
                let count: u32 = count_text.trim().parse().map_err(|_| SyntaxError::InvalidAttribute {
                    name: "count".to_string(),
                    value: count_text.clone(),
                })?;
                let var = match child.attribute("var") {
                    Some(var) => substitute(var, |name| scope.lookup(name), true)?,
                    None => String::new(),
                };
                for index in 0..count {
                    if var.is_empty() {
                        traverse_children(child, scope, visitor)?;
                    } else {
                        let inner = scope.with_binding(&var, index.to_string());
                        traverse_children(child, &inner, visitor)?;
                    }
                }
            }
            _ => {
                let resolved = resolve(child, scope)?;
                visitor(&resolved)?;
            }
        }
        last_condition = None;
    }
    Ok(())
}

fn required_attribute(element: &Element, name: &str, scope: &Scope<'_>) -> Result<String, SyntaxError> {
    let raw = element
        .attribute(name)
        .ok_or_else(|| SyntaxError::MissingAttribute {
            element: element.name().to_string(),
            name: name.to_string(),
        })?;
    substitute(raw, |var| scope.lookup(var), true)
}

/// Produces the element the visitor sees: attributes and text fully
/// expanded, descendants expanded with loop bindings only. Global
/// references in descendants are left for the nested traversal.
fn resolve(element: &Element, scope: &Scope<'_>) -> Result<Element, SyntaxError> {
    let mut resolved = element.clone();
    for value in resolved.attributes_mut().values_mut() {
        *value = substitute(value, |name| scope.lookup(name), true)?;
    }
    if let Some(text) = element.text() {
        resolved.set_text(Some(substitute(text, |name| scope.lookup(name), true)?));
    }
    if !scope.locals.is_empty() {
        for child in resolved.children_mut() {
            substitute_locals(child, scope)?;
        }
    }
    Ok(resolved)
}

fn substitute_locals(element: &mut Element, scope: &Scope<'_>) -> Result<(), SyntaxError> {
    for value in element.attributes_mut().values_mut() {
        *value = substitute(value, |name| scope.lookup_local(name), false)?;
    }
    if let Some(text) = element.text() {
        let expanded = substitute(text, |name| scope.lookup_local(name), false)?;
        element.set_text(Some(expanded));
    }
    for child in element.children_mut() {
        substitute_locals(child, scope)?;
    }
    Ok(())
}

/// Replaces `${name}` references. With `strict`, unknown names fail;
/// otherwise they are kept verbatim.
fn substitute<'s, L>(text: &str, lookup: L, strict: bool) -> Result<String, SyntaxError>
where
    L: Fn(&str) -> Option<&'s str>,
{
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let Some(end) = tail.find('}') else {
            if strict {
                return Err(SyntaxError::UnresolvedVariable(tail.to_string()));
            }
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let name = &tail[..end];
        match lookup(name) {
            Some(value) => out.push_str(value),
            None if strict => return Err(SyntaxError::UnresolvedVariable(name.to_string())),
            None => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::markup;

    fn visit_names(traversor: &ElementTreeTraversor, source: &str) -> Result<Vec<String>, SyntaxError> {
        let root = markup::parse(source).unwrap();
        let mut names = Vec::new();
        traversor.traverse(&root, &mut |element: &Element| {
            names.push(element.attribute("id").unwrap_or(element.name()).to_string());
            Ok(())
        })?;
        Ok(names)
    }

    #[test]
    fn test_document_order() {
        let traversor = ElementTreeTraversor::new();
        let names = visit_names(&traversor, "<Root><A id='a'/><B id='b'/><C id='c'/></Root>").unwrap();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_variables_are_expanded() {
        let mut traversor = ElementTreeTraversor::new();
        traversor.define_variable("track", "snow");
        let names = visit_names(&traversor, "<Root><Image id='bg-${track}'/></Root>").unwrap();
        assert_eq!(names, vec!["bg-snow"]);
    }

    #[test]
    fn test_unresolved_variable_fails() {
        let traversor = ElementTreeTraversor::new();
        let err = visit_names(&traversor, "<Root><Image id='${nope}'/></Root>").unwrap_err();
        assert_eq!(err, SyntaxError::UnresolvedVariable("nope".to_string()));
    }

    #[test]
    fn test_ifdef_else() {
        let mut traversor = ElementTreeTraversor::new();
        let source = "<Root><Ifdef var='desktop'><A id='quit'/></Ifdef><Else><A id='back'/></Else><A id='last'/></Root>";
        assert_eq!(visit_names(&traversor, source).unwrap(), vec!["back", "last"]);
        traversor.define_variable("desktop", "");
        assert_eq!(visit_names(&traversor, source).unwrap(), vec!["quit", "last"]);
    }

    #[test]
    fn test_dangling_else_fails() {
        let traversor = ElementTreeTraversor::new();
        let err = visit_names(&traversor, "<Root><A/><Else><B/></Else></Root>").unwrap_err();
        assert_eq!(err, SyntaxError::DanglingElse);
    }

    #[test]
    fn test_repeat_binds_loop_variable_in_subtree() {
        let traversor = ElementTreeTraversor::new();
        let root = markup::parse(
            "<Root><Repeat count='3' var='i'><Group id='slot${i}'><Label id='label${i}'/></Group></Repeat></Root>",
        )
        .unwrap();
        let mut seen = Vec::new();
        traversor
            .traverse(&root, &mut |element: &Element| {
                let child_id = element.children()[0].attribute("id").unwrap().to_string();
                seen.push((element.attribute("id").unwrap().to_string(), child_id));
                Ok(())
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![
                ("slot0".to_string(), "label0".to_string()),
                ("slot1".to_string(), "label1".to_string()),
                ("slot2".to_string(), "label2".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_traversal_is_independent() {
        let traversor = ElementTreeTraversor::new();
        let root = markup::parse("<Root><G id='g1'><A id='a'/><B id='b'/></G><G id='g2'/></Root>").unwrap();
        let mut order = Vec::new();
        traversor
            .traverse(&root, &mut |element: &Element| {
                order.push(element.attribute("id").unwrap().to_string());
                traversor.traverse(element, &mut |inner: &Element| {
                    order.push(inner.attribute("id").unwrap().to_string());
                    Ok(())
                })
            })
            .unwrap();
        assert_eq!(order, vec!["g1", "a", "b", "g2"]);
    }

    #[test]
    fn test_prev_reference_is_not_a_variable() {
        let traversor = ElementTreeTraversor::new();
        let names = visit_names(&traversor, "<Root><A id='$prev'/></Root>").unwrap();
        assert_eq!(names, vec!["$prev"]);
    }
}
