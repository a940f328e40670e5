use std::ops::{Add, Mul, Sub};

use choreo_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const ZERO: Point3 = Point3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(&self, other: &Point3) -> f32 {
        (*self - *other).length()
    }

    pub fn normalized(&self) -> Option<Point3> {
        let length = self.length();
        if length <= f32::EPSILON {
            return None;
        }
        Some(*self * (1.0 / length))
    }
}

impl Add for Point3 {
    type Output = Point3;

    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Point3 {
    type Output = Point3;

    fn mul(self, rhs: f32) -> Point3 {
        Point3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Unit quaternion rotation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Rotation of `angle` radians around `axis`. A degenerate axis yields identity.
    pub fn from_axis_angle(axis: Point3, angle: f32) -> Self {
        let Some(axis) = axis.normalized() else {
            return Quat::IDENTITY;
        };
        let (sin, cos) = (angle * 0.5).sin_cos();
        Quat {
            x: axis.x * sin,
            y: axis.y * sin,
            z: axis.z * sin,
            w: cos,
        }
    }
}

impl Default for Quat {
    fn default() -> Self {
        Quat::IDENTITY
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform {
    pub position: Point3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Point3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Point3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Point3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

// Serde

impl Serde for Point3 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.x.ser(writer);
        self.y.ser(writer);
        self.z.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Point3::new(f32::de(reader)?, f32::de(reader)?, f32::de(reader)?))
    }

    fn bit_length(&self) -> u32 {
        <Self as ConstBitLength>::const_bit_length()
    }
}

impl ConstBitLength for Point3 {
    fn const_bit_length() -> u32 {
        <f32 as ConstBitLength>::const_bit_length() * 3
    }
}

impl Serde for Quat {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.x.ser(writer);
        self.y.ser(writer);
        self.z.ser(writer);
        self.w.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Quat {
            x: f32::de(reader)?,
            y: f32::de(reader)?,
            z: f32::de(reader)?,
            w: f32::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        <f32 as ConstBitLength>::const_bit_length() * 4
    }
}

impl Serde for Transform {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.position.ser(writer);
        self.rotation.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Transform {
            position: Point3::de(reader)?,
            rotation: Quat::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.position.bit_length() + self.rotation.bit_length()
    }
}
