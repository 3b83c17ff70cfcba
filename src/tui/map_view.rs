use crate::map::{MapSync, ViewportBackend};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::canvas::{Canvas, Map, MapResolution, Points},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Smallest visible longitude span; below this the world outline vanishes.
const MIN_SPAN_DEG: f64 = 8.0;

pub fn draw_map(area: Rect, f: &mut Frame, map: &MapSync<ViewportBackend>) {
    let Some(viewport) = map.map() else {
        let p = Paragraph::new("Map not initialized")
            .block(Block::default().borders(Borders::ALL).title("Map"));
        f.render_widget(p, area);
        return;
    };

    let title = Line::from(vec![
        Span::raw("Map "),
        Span::styled(
            format!(
                "({:.3}, {:.3}) z{}",
                viewport.view.center.lat, viewport.view.center.lng, viewport.view.zoom
            ),
            Style::default().fg(Color::Gray),
        ),
    ]);
    let attribution = Line::from(Span::styled(
        viewport.tiles.attribution.clone(),
        Style::default().fg(Color::DarkGray),
    ))
    .right_aligned();

    // Braille cells are twice as tall as they are wide.
    let aspect = f64::from(area.width.max(1)) / (f64::from(area.height.max(1)) * 2.0);
    let (x_bounds, y_bounds) = viewport.bounds(aspect, MIN_SPAN_DEG);
    let marker = map.marker().map(|m| (m.position.lng, m.position.lat));

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_bottom(attribution),
        )
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(move |ctx| {
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            if let Some((x, y)) = marker {
                ctx.layer();
                ctx.draw(&Points {
                    coords: &[(x, y)],
                    color: Color::Red,
                });
                ctx.print(x, y, Span::styled(" ◆", Style::default().fg(Color::Red)));
            }
        });
    f.render_widget(canvas, area);
}
