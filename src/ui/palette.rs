use iced::widget::{button, text};
use iced::{Background, Border, Color, Element};
use iced_aw::Wrap;

use roof_recolor::catalog::CATALOG;
use roof_recolor::color::Rgb;

use crate::Message;

/// One swatch per catalog color, wrapped into rows
///
/// The first nine carry their number-key shortcut in the label.
pub fn palette<'a>(applied: Option<&str>, enabled: bool) -> Element<'a, Message> {
    let swatches: Vec<Element<'a, Message>> = CATALOG
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let label = if index < 9 {
                format!("{} {}", index + 1, entry.name)
            } else {
                entry.name.to_string()
            };
            let fill = to_iced(entry.rgb());
            let ink = label_color(entry.rgb());
            let active = applied == Some(entry.name);

            button(text(label).size(12))
                .padding([6, 10])
                .on_press_maybe(enabled.then_some(Message::ColorChosen(index)))
                .style(move |_theme, _status| button::Style {
                    background: Some(Background::Color(fill)),
                    text_color: ink,
                    border: Border {
                        color: if active { Color::WHITE } else { Color::TRANSPARENT },
                        width: 2.0,
                        radius: 4.0.into(),
                    },
                    ..Default::default()
                })
                .into()
        })
        .collect();

    Wrap::with_elements(swatches).spacing(6.0).line_spacing(6.0).into()
}

fn to_iced(rgb: Rgb) -> Color {
    Color::from_rgb8(rgb.r, rgb.g, rgb.b)
}

/// Dark text on light swatches, light text on dark ones
fn label_color(rgb: Rgb) -> Color {
    if rgb.to_hsl().l > 0.6 {
        Color::BLACK
    } else {
        Color::WHITE
    }
}
