use anyhow::Context as _;
use scraper::{Html, Selector};
use serde::Serialize;

const CALLBACK_PREFIX: &str = "showLocation(";
const PLACE_TAG_SELECTOR: &str = r#"a[onclick^="showLocation("]"#;
const FIELD_COUNT: usize = 11;

/// A geographic reference embedded in chapter markup.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlaceTag {
    pub geotag_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub view_latitude: f64,
    pub view_longitude: f64,
    pub view_tilt: f64,
    pub view_roll: f64,
    pub view_altitude: f64,
    pub view_heading: f64,
    pub flag: String,
}

impl PlaceTag {
    /// Place name with the flag appended when one is present.
    pub fn display_name(&self) -> String {
        if self.flag.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.flag)
        }
    }
}

/// Chapter markup together with the places it mentions, in document order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Chapter {
    pub book_id: u32,
    pub chapter: u32,
    pub html: String,
    pub places: Vec<PlaceTag>,
}

impl Chapter {
    pub fn from_html(book_id: u32, chapter: u32, html: String) -> anyhow::Result<Self> {
        let places = extract_places(&html)?;
        Ok(Self {
            book_id,
            chapter,
            html,
            places,
        })
    }
}

/// Collects every `showLocation(...)` callback in `html`. Callbacks that do
/// not have the expected shape are skipped.
pub fn extract_places(html: &str) -> anyhow::Result<Vec<PlaceTag>> {
    let selector = Selector::parse(PLACE_TAG_SELECTOR)
        .map_err(|err| anyhow::anyhow!("parse place tag selector: {err}"))?;
    let doc = Html::parse_fragment(html);

    let mut places = Vec::new();
    for element in doc.select(&selector) {
        let Some(callback) = element.value().attr("onclick") else {
            continue;
        };
        match parse_show_location(callback) {
            Ok(place) => places.push(place),
            Err(err) => tracing::debug!(callback, ?err, "skipping malformed place tag"),
        }
    }

    Ok(places)
}

/// Parses `showLocation(id,'name',lat,lng,vlat,vlng,tilt,roll,alt,heading,'flag')`.
pub fn parse_show_location(callback: &str) -> anyhow::Result<PlaceTag> {
    let callback = callback.trim();
    let start = callback
        .find(CALLBACK_PREFIX)
        .context("missing showLocation( prefix")?
        + CALLBACK_PREFIX.len();
    let end = callback.rfind(')').context("missing closing parenthesis")?;
    if end < start {
        anyhow::bail!("closing parenthesis precedes arguments");
    }

    let args = split_arguments(&callback[start..end])?;
    if args.len() != FIELD_COUNT {
        anyhow::bail!("expected {FIELD_COUNT} arguments, found {}", args.len());
    }

    let number = |idx: usize, field: &str| -> anyhow::Result<f64> {
        args[idx]
            .value
            .trim()
            .parse::<f64>()
            .with_context(|| format!("parse {field}: {:?}", args[idx].value))
    };
    let quoted = |idx: usize, field: &str| -> anyhow::Result<String> {
        if !args[idx].quoted {
            anyhow::bail!("{field} must be quoted");
        }
        Ok(args[idx].value.clone())
    };

    Ok(PlaceTag {
        geotag_id: args[0].value.trim().to_owned(),
        name: quoted(1, "place name")?,
        latitude: number(2, "latitude")?,
        longitude: number(3, "longitude")?,
        view_latitude: number(4, "view latitude")?,
        view_longitude: number(5, "view longitude")?,
        view_tilt: number(6, "view tilt")?,
        view_roll: number(7, "view roll")?,
        view_altitude: number(8, "view altitude")?,
        view_heading: number(9, "view heading")?,
        flag: quoted(10, "flag")?,
    })
}

#[derive(Debug)]
struct Argument {
    value: String,
    quoted: bool,
}

fn split_arguments(input: &str) -> anyhow::Result<Vec<Argument>> {
    let mut args = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.peek().is_some_and(|ch| ch.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        let quoted = chars.peek() == Some(&'\'');
        if quoted {
            chars.next();
            loop {
                match chars.next() {
                    Some('\\') => {
                        let escaped = chars.next().context("dangling escape")?;
                        value.push(escaped);
                    }
                    Some('\'') => break,
                    Some(ch) => value.push(ch),
                    None => anyhow::bail!("unterminated string argument"),
                }
            }
            while chars.peek().is_some_and(|ch| ch.is_whitespace()) {
                chars.next();
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch == ',' {
                    break;
                }
                value.push(ch);
                chars.next();
            }
        }

        args.push(Argument { value, quoted });

        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(ch) => anyhow::bail!("unexpected {ch:?} after argument"),
        }
    }

    Ok(args)
}
