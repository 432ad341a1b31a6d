//! Reader for phantom model libraries.
//!
//! A library is a plain text file holding any number of models, each
//! introduced by a `Model` line and followed by its header and objects:
//!
//! ```text
//! # Comments run to the end of the line
//! Model : 02;
//! Components : 2;
//! TimeSteps : 1;
//! Object : ellipse  1.0  0.0 0.0  0.5 0.5  0.0;
//! Object : gaussian 0.5 -0.2 0.3  0.3 0.15 45.0;
//! ```
//!
//! Object fields are `kind C0 x0 y0 a b phi`, with `phi` in degrees.

use std::borrow::Cow;
use std::path::Path;
use std::sync::OnceLock;

use geometry::Point;
use units::deg;

use crate::{Error, Result};
use super::{Kind, Model, Object};

const BUILTIN: &str = include_str!("../../data/Phantom2DLibrary.dat");

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Library {
    models: Vec<Model>,
}

impl Library {

    /// The library shipped with the crate
    pub fn builtin() -> &'static Library {
        static LIBRARY: OnceLock<Library> = OnceLock::new();
        LIBRARY.get_or_init(|| Library::parse(BUILTIN).expect("built-in phantom library is well formed"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(Error::io(path))?;
        Self::parse(&text)
    }

    /// The library at `path`, or the built-in one if no path is given
    pub fn load(path: Option<&Path>) -> Result<Cow<'static, Library>> {
        Ok(match path {
            Some(path) => Cow::Owned(Self::from_file(path)?),
            None       => Cow::Borrowed(Self::builtin()),
        })
    }

    pub fn model(&self, id: u32) -> Result<&Model> {
        self.models.iter().find(|m| m.id == id).ok_or(Error::ModelNotFound(id))
    }

    pub fn models(&self) -> &[Model] { &self.models }

    pub fn parse(text: &str) -> Result<Self> {
        let mut library = Library::default();
        let mut current: Option<Pending> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let err = |message: String| Error::Library { line, message };

            let content = raw.split('#').next().unwrap_or("").trim();
            if content.is_empty() { continue }

            let (key, value) = content.split_once(':')
                .ok_or_else(|| err(format!("expected `Key : value;`, found `{content}`")))?;
            let value = value.trim().trim_end_matches(';').trim();

            match key.trim() {
                "Model" => {
                    if let Some(pending) = current.take() { pending.finish_into(&mut library)?; }
                    let id = value.parse().map_err(|_| err(format!("bad model number `{value}`")))?;
                    current = Some(Pending { id, line, components: None, objects: vec![] });
                }
                key => {
                    let pending = current.as_mut()
                        .ok_or_else(|| err(format!("`{key}` appears before any `Model` line")))?;
                    match key {
                        "Components" => {
                            let n = value.parse().map_err(|_| err(format!("bad component count `{value}`")))?;
                            pending.components = Some(n);
                        }
                        "TimeSteps" => {
                            let steps: u32 = value.parse().map_err(|_| err(format!("bad time step count `{value}`")))?;
                            if steps != 1 {
                                return Err(err(format!("temporal models are not supported (TimeSteps = {steps})")))
                            }
                        }
                        "Object" => pending.objects.push(parse_object(value).map_err(err)?),
                        other => return Err(err(format!("unknown key `{other}`"))),
                    }
                }
            }
        }
        if let Some(pending) = current.take() { pending.finish_into(&mut library)?; }
        Ok(library)
    }
}

/// A model whose lines are still being read
struct Pending {
    id: u32,
    line: usize,
    components: Option<usize>,
    objects: Vec<Object>,
}

impl Pending {
    fn finish_into(self, library: &mut Library) -> Result<()> {
        let Pending { id, line, components, objects } = self;
        if library.models.iter().any(|m| m.id == id) {
            return Err(Error::Library { line, message: format!("model {id} defined more than once") })
        }
        if let Some(expected) = components {
            if expected != objects.len() {
                return Err(Error::Library {
                    line,
                    message: format!("model {id} declares {expected} components but has {}", objects.len()),
                })
            }
        }
        if objects.is_empty() {
            return Err(Error::Library { line, message: format!("model {id} has no objects") })
        }
        library.models.push(Model { id, objects });
        Ok(())
    }
}

fn parse_object(value: &str) -> std::result::Result<Object, String> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    let &[kind, c0, x0, y0, a, b, phi] = fields.as_slice() else {
        return Err(format!("object needs 7 fields (kind C0 x0 y0 a b phi), found {}", fields.len()))
    };
    let kind: Kind = kind.parse()?;
    let number = |s: &str| s.parse::<f32>().ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("bad number `{s}`"));
    let (a, b) = (number(a)?, number(b)?);
    if !(a > 0.0) || !(b > 0.0) {
        return Err(format!("half-axes must be positive, found ({a}, {b})"))
    }
    Ok(Object {
        kind,
        intensity: number(c0)?,
        centre: Point::new(number(x0)?, number(y0)?),
        half_axes: (a, b),
        rotation: deg(number(phi)?),
    })
}
