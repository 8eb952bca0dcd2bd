use rust_embed::RustEmbed;
use std::borrow::Cow;

#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Asset;

pub fn get_asset_bytes(name: &str) -> Option<Cow<'static, [u8]>> {
    Asset::get(name).map(|f| f.data)
}

/// Markup of the embedded screen `assets/ui/<name>.xml`
pub fn ui_markup(name: &str) -> Option<String> {
    let bytes = get_asset_bytes(&format!("ui/{}.xml", name))?;
    String::from_utf8(bytes.into_owned()).ok()
}

/// Names of the embedded UI screens
pub fn ui_screens() -> Vec<String> {
    Asset::iter()
        .filter_map(|path| {
            path.strip_prefix("ui/")
                .and_then(|name| name.strip_suffix(".xml"))
                .map(str::to_string)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::markup;

    #[test]
    fn test_embedded_screens_parse() {
        let screens = ui_screens();
        assert!(screens.contains(&"hud".to_string()));
        assert!(screens.contains(&"finished".to_string()));
        for name in screens {
            let source = ui_markup(&name).unwrap();
            let root = markup::parse(&source).unwrap_or_else(|e| panic!("{}: {}", name, e));
            assert_eq!(root.name(), "Ui");
        }
    }

    #[test]
    fn test_missing_screen() {
        assert!(ui_markup("credits").is_none());
    }
}
