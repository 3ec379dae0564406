//! Turns model queries into ratatui styling.
//!
//! The model speaks in RGBA entries, alignment enums and hints; a terminal
//! view needs `Color`s it can actually show. [`CellStyler`] bridges the two
//! using the configured theme and the terminal's color depth.

use color_eyre::Result;
use ratatui::layout::Alignment;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Cell;

use crate::colormap::Rgba;
use crate::config::{ColorMode, ColorParser, Theme, ThemeConfig};
use crate::model::{CellAlignment, ForegroundHint, Orientation, TabularModel};

impl From<CellAlignment> for Alignment {
    fn from(alignment: CellAlignment) -> Self {
        match alignment {
            CellAlignment::Left => Alignment::Left,
            CellAlignment::Center => Alignment::Center,
            CellAlignment::Right => Alignment::Right,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CellStyler {
    parser: ColorParser,
    theme: Theme,
}

impl CellStyler {
    /// Styler for the configured theme and color mode.
    pub fn new(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::for_mode(ColorMode::parse(&config.color_mode)?);
        let theme = Theme::with_parser(config, &parser)?;
        Ok(Self { parser, theme })
    }

    pub fn with_parts(parser: ColorParser, theme: Theme) -> Self {
        Self { parser, theme }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Terminal color for an overlay entry, composited onto the theme's
    /// overlay base.
    pub fn overlay_color(&self, rgba: Rgba) -> Color {
        let (r, g, b) = rgba.blend_over(self.theme.overlay_base);
        self.parser.rgb(r, g, b)
    }

    pub fn cell_style(&self, model: &TabularModel, row: usize, col: usize) -> Style {
        let mut style = Style::default();
        if let Some(rgba) = model.cell_overlay_color(row, col) {
            style = style.bg(self.overlay_color(rgba));
        }
        if let Some(ForegroundHint::Negative) = model.cell_foreground_hint(row, col) {
            style = style.fg(self.theme.get("negative"));
        }
        style
    }

    pub fn header_style(&self, orientation: Orientation) -> Style {
        match orientation {
            Orientation::Horizontal => Style::default()
                .fg(self.theme.get("header"))
                .add_modifier(Modifier::BOLD),
            Orientation::Vertical => Style::default().fg(self.theme.get("row_header")),
        }
    }

    /// A fully styled table cell. Unaligned cells fall back to `fallback`.
    pub fn cell(
        &self,
        model: &TabularModel,
        row: usize,
        col: usize,
        fallback: Alignment,
    ) -> Cell<'static> {
        let alignment = model
            .cell_alignment(row, col)
            .map(Alignment::from)
            .unwrap_or(fallback);
        let line = Line::from(model.cell_display_string(row, col)).alignment(alignment);
        Cell::from(line).style(self.cell_style(model, row, col))
    }

    /// Header cell for a column (horizontal) or row (vertical).
    pub fn header_cell(
        &self,
        model: &TabularModel,
        section: usize,
        orientation: Orientation,
    ) -> Cell<'static> {
        let alignment = match orientation {
            Orientation::Horizontal => Alignment::Left,
            Orientation::Vertical => Alignment::Right,
        };
        let line = Line::from(model.header_label(section, orientation)).alignment(alignment);
        Cell::from(line).style(self.header_style(orientation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TableOptions, Target};
    use polars::prelude::*;

    fn styler() -> CellStyler {
        let parser = ColorParser::with_capabilities(true, true, false);
        let theme = Theme::with_parser(&ThemeConfig::default(), &parser).unwrap();
        CellStyler::with_parts(parser, theme)
    }

    fn model() -> TabularModel {
        let frame = df!("v" => &[-2.0, 0.0, 2.0]).unwrap();
        let options = TableOptions::default().with_colormap("Greys", vec![Target::column("v")]);
        TabularModel::new(frame, options).unwrap()
    }

    #[test]
    fn test_alignment_conversion() {
        assert_eq!(Alignment::from(CellAlignment::Left), Alignment::Left);
        assert_eq!(Alignment::from(CellAlignment::Center), Alignment::Center);
        assert_eq!(Alignment::from(CellAlignment::Right), Alignment::Right);
    }

    #[test]
    fn test_opaque_overlay_ignores_base() {
        let styler = styler();
        assert_eq!(
            styler.overlay_color(Rgba::new(10, 20, 30, 255)),
            Color::Rgb(10, 20, 30)
        );
    }

    #[test]
    fn test_transparent_overlay_shows_base() {
        let styler = styler();
        assert_eq!(
            styler.overlay_color(Rgba::new(200, 200, 200, 0)),
            Color::Rgb(0, 0, 0)
        );
    }

    #[test]
    fn test_negative_cell_gets_theme_color() {
        let styler = styler();
        let model = model();
        let style = styler.cell_style(&model, 0, 1);
        assert_eq!(style.fg, Some(Color::Red));
        assert!(style.bg.is_some());
        assert_eq!(styler.cell_style(&model, 2, 1).fg, None);
    }

    #[test]
    fn test_idx_column_has_no_background() {
        let styler = styler();
        let model = model();
        assert_eq!(styler.cell_style(&model, 0, 0).bg, None);
    }

    #[test]
    fn test_basic_terminal_degrades_overlay() {
        let parser = ColorParser::with_capabilities(false, false, false);
        let theme = Theme::with_parser(&ThemeConfig::default(), &parser).unwrap();
        let styler = CellStyler::with_parts(parser, theme);
        assert_eq!(styler.overlay_color(Rgba::new(250, 10, 10, 255)), Color::Red);
    }
}
