/// Units which are simply type aliases for `f32` rather than having an
/// implementation as a `uom` `Quantity`.
///
/// Phantom coordinates live in the normalised square `[-1, 1]²` and image
/// values are attenuation coefficients in arbitrary units, so neither has a
/// natural SI representation. The aliases still document what a bare `f32`
/// stands for.

pub type Lengthf32    = f32; // normalised [-1, 1] coordinates
pub type Pixelsf32    = f32; // lengths measured in pixel widths
pub type Intensityf32 = f32; // attenuation, arbitrary units
