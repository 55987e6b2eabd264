use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::location::{Category, DEFAULT_COLOR};

/// Icon box in icon units (before scaling).
pub const ICON_WIDTH: f64 = 24.0;
pub const ICON_HEIGHT: f64 = 36.0;
/// Teardrop outline in icon units, tip at the bottom center.
pub const TEARDROP_PATH: &str =
    "M12 0.5C5.65 0.5 0.5 5.65 0.5 12C0.5 20.5 12 35.5 12 35.5S23.5 20.5 23.5 12C23.5 5.65 18.35 0.5 12 0.5Z";
/// Inner circle center and radius in icon units.
pub const CIRCLE: (f64, f64, f64) = (12.0, 12.0, 5.0);
pub const DEFAULT_CIRCLE_FILL: &str = "white";
pub const DEFAULT_STROKE: &str = "rgba(0,0,0,0.45)";

const SVG_TEMPLATE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}"><path d="{path}" fill="{fill}" stroke="{stroke}" stroke-width="1"/><circle cx="{cx}" cy="{cy}" r="{r}" fill="{circle}"/></svg>"#;

/// Characters escaped when embedding SVG markup in a `data:` URI.
const DATA_URI_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconShape {
    Teardrop,
}

/// Everything needed to draw a marker icon, independent of how it is rasterized.
#[derive(Debug, Clone, PartialEq)]
pub struct IconDescriptor {
    pub shape: IconShape,
    pub fill: String,
    pub stroke: String,
    pub circle_fill: String,
    /// Unscaled icon size in pixels.
    pub size: (f64, f64),
    pub scale: f64,
    /// Fraction of the icon box placed on the marker position; (0.5, 1.0) is bottom center.
    pub anchor: (f64, f64),
}

impl IconDescriptor {
    pub fn for_category(category: Category) -> Self {
        Self::with_fill(category.color())
    }

    /// Descriptor for a CSS color name; unknown or empty names use the default red fill.
    pub fn for_color_name(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "red" | "green" | "blue" => Self::with_fill(&name),
            _ => Self::with_fill(DEFAULT_COLOR),
        }
    }

    fn with_fill(fill: &str) -> Self {
        Self {
            shape: IconShape::Teardrop,
            fill: fill.to_string(),
            stroke: DEFAULT_STROKE.to_string(),
            circle_fill: DEFAULT_CIRCLE_FILL.to_string(),
            size: (ICON_WIDTH, ICON_HEIGHT),
            scale: 1.0,
            anchor: (0.5, 1.0),
        }
    }

    pub fn with_circle_fill(mut self, circle_fill: &str) -> Self {
        self.circle_fill = circle_fill.to_string();
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
        self
    }

    pub fn pixel_size(&self) -> (f64, f64) {
        (self.size.0 * self.scale, self.size.1 * self.scale)
    }

    /// Screen rectangle `(left, top, width, height)` of the icon drawn at pixel `at`.
    pub fn pixel_rect(&self, at: (f64, f64)) -> (f64, f64, f64, f64) {
        let (w, h) = self.pixel_size();
        (at.0 - self.anchor.0 * w, at.1 - self.anchor.1 * h, w, h)
    }

    pub fn contains_pixel(&self, at: (f64, f64), px: (f64, f64)) -> bool {
        let (left, top, w, h) = self.pixel_rect(at);
        px.0 >= left && px.0 <= left + w && px.1 >= top && px.1 <= top + h
    }

    /// Key shared by descriptors that rasterize identically.
    pub fn cache_key(&self) -> String {
        format!("{}|{}|{}", self.fill, self.stroke, self.circle_fill)
    }

    pub fn to_svg(&self) -> String {
        let (cx, cy, r) = CIRCLE;
        match self.shape {
            IconShape::Teardrop => SVG_TEMPLATE
                .replace("{width}", &self.size.0.to_string())
                .replace("{height}", &self.size.1.to_string())
                .replace("{path}", TEARDROP_PATH)
                .replace("{fill}", &self.fill)
                .replace("{stroke}", &self.stroke)
                .replace("{cx}", &cx.to_string())
                .replace("{cy}", &cy.to_string())
                .replace("{r}", &r.to_string())
                .replace("{circle}", &self.circle_fill),
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!(
            "data:image/svg+xml;charset=utf-8,{}",
            utf8_percent_encode(&self.to_svg(), DATA_URI_SET)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_colors() {
        assert_eq!(IconDescriptor::for_category(Category::Wanted).fill, "blue");
        assert_eq!(IconDescriptor::for_category(Category::Resided).fill, "green");
        assert_eq!(IconDescriptor::for_category(Category::Visited).fill, "red");
    }

    #[test]
    fn color_names_fall_back_to_red() {
        assert_eq!(IconDescriptor::for_color_name("blue").fill, "blue");
        assert_eq!(IconDescriptor::for_color_name("Green").fill, "green");
        assert_eq!(IconDescriptor::for_color_name("red").fill, "red");
        assert_eq!(IconDescriptor::for_color_name("").fill, "red");
        assert_eq!(IconDescriptor::for_color_name("chartreuse").fill, "red");
    }

    #[test]
    fn circle_is_white_unless_overridden() {
        for category in Category::ALL {
            assert_eq!(IconDescriptor::for_category(category).circle_fill, "white");
        }
        let custom = IconDescriptor::for_category(Category::Wanted).with_circle_fill("black");
        assert_eq!(custom.circle_fill, "black");
        assert!(custom.to_svg().contains(r#"r="5" fill="black""#));
    }

    #[test]
    fn svg_substitutes_every_placeholder() {
        let svg = IconDescriptor::for_category(Category::Resided).to_svg();
        assert!(!svg.contains('{'), "unfilled placeholder in {svg}");
        assert!(svg.contains(r#"fill="green""#));
        assert!(svg.contains(r#"fill="white""#));
        assert!(svg.contains(r#"viewBox="0 0 24 36""#));
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn data_uri_is_escaped() {
        let uri = IconDescriptor::for_color_name("blue").to_data_uri();
        assert!(uri.starts_with("data:image/svg+xml;charset=utf-8,%3Csvg%20"));
        assert!(!uri.contains('<'));
        assert!(!uri.contains('"'));
        assert!(!uri.contains(' '));
    }

    #[test]
    fn anchored_bottom_center() {
        let icon = IconDescriptor::for_category(Category::Visited).with_scale(2.0);
        assert_eq!(icon.pixel_size(), (48.0, 72.0));
        assert_eq!(icon.pixel_rect((100.0, 100.0)), (76.0, 28.0, 48.0, 72.0));
        assert!(icon.contains_pixel((100.0, 100.0), (100.0, 99.0)));
        assert!(icon.contains_pixel((100.0, 100.0), (76.0, 28.0)));
        assert!(!icon.contains_pixel((100.0, 100.0), (100.0, 101.0)));
        assert!(!icon.contains_pixel((100.0, 100.0), (75.0, 50.0)));
    }

    #[test]
    fn invalid_scale_is_ignored() {
        let icon = IconDescriptor::for_category(Category::Visited)
            .with_scale(0.0)
            .with_scale(f64::NAN);
        assert_eq!(icon.scale, 1.0);
    }
}
