//! SVG builder — accumulates elements and produces the final string.

pub(super) struct SvgBuilder {
    elements: Vec<String>,
    width: f64,
    height: f64,
    scale: f64,
}

impl SvgBuilder {
    pub(super) fn new(width: f64, height: f64, scale: f64) -> Self {
        Self {
            elements: Vec::new(),
            width,
            height,
            scale,
        }
    }

    pub(super) fn build(self, font_family: &str) -> String {
        let out_w = self.width * self.scale;
        let out_h = self.height * self.scale;
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {:.1} {:.1}" width="{:.1}" height="{:.1}" style="font-family: {};">"#,
            self.width, self.height, out_w, out_h, font_family
        );
        svg.push('\n');
        for el in &self.elements {
            svg.push_str("  ");
            svg.push_str(el);
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }

    pub(super) fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: &str, width: f64) {
        self.elements.push(format!(
            r#"<line x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}" stroke="{color}" stroke-width="{width:.1}" stroke-linecap="round"/>"#,
        ));
    }

    pub(super) fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str) {
        self.elements.push(format!(
            r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="{fill}"/>"#,
        ));
    }

    pub(super) fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) {
        self.elements.push(format!(
            r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{r:.1}" fill="{fill}"/>"#,
        ));
    }

    pub(super) fn text(
        &mut self,
        x: f64,
        y: f64,
        content: &str,
        size: f64,
        weight: &str,
        fill: &str,
        anchor: &str,
    ) {
        let escaped = escape(content);
        self.elements.push(format!(
            r#"<text x="{x:.1}" y="{y:.1}" font-size="{size:.0}" font-weight="{weight}" fill="{fill}" text-anchor="{anchor}">{escaped}</text>"#,
        ));
    }

    /// A filled or hollow notehead ellipse, tilted the way engraved
    /// noteheads sit.
    pub(super) fn notehead(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, filled: bool, color: &str) {
        if filled {
            self.elements.push(format!(
                r#"<ellipse cx="{cx:.1}" cy="{cy:.1}" rx="{rx:.1}" ry="{ry:.1}" fill="{color}" transform="rotate(-15,{cx:.1},{cy:.1})"/>"#,
            ));
        } else {
            self.elements.push(format!(
                r#"<ellipse cx="{cx:.1}" cy="{cy:.1}" rx="{rx:.1}" ry="{ry:.1}" fill="none" stroke="{color}" stroke-width="1.6" transform="rotate(-15,{cx:.1},{cy:.1})"/>"#,
            ));
        }
    }

    pub(super) fn path(&mut self, d: &str, fill: &str, stroke: &str, stroke_width: f64) {
        self.elements.push(format!(
            r#"<path d="{d}" fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width:.1}"/>"#,
        ));
    }
}

pub(super) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Placeholder output when there is nothing to engrave.
pub(super) fn empty_svg(message: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 400 100\">\
         <text x=\"200\" y=\"50\" text-anchor=\"middle\" font-size=\"14\" fill=\"gray\">{}</text>\
         </svg>",
        escape(message)
    )
}
