// MRC file (from the Medical Research Council, in the UK)
// https://en.wikipedia.org/wiki/MRC_(file_format)

// format specification:
// https://www.ccpem.ac.uk/mrc_format/mrc2014.php

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt, BE, LE};


const HEADER_BYTES: usize = 1024;


/// How the sections of an MRC file fit together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
	/// just one section
	Image,
	/// independent 2D images, eg a tilt series
	ImageStack,
	/// sections of one 3D map, eg a tomogram
	Volume
}


/// A stack of 2D images or a 3D volume, stored as 32-bit floats
#[derive(Debug, Clone, PartialEq)]
pub struct Mrc {
	nx: u32,
	ny: u32,
	nz: u32,
	/// in Angstroms per pixel
	pixel_size: f32,
	/// ISPG header word: 0 for image stacks, 1-230 for volumes, 401-630 for volume stacks
	space_group: i32,
	/// sampling along z (MZ header word): 1 for image stacks, nz for a single volume
	mz: u32,
	voxels: Vec<f32>
}

impl Mrc {

	/// an image stack, with `nz` images
	pub fn new(nx: u32, ny: u32, nz: u32) -> Self {
		Self {
			nx,
			ny,
			nz,
			pixel_size: 1.0,
			space_group: 0,
			mz: 1,
			voxels: vec![0f32; (nx as usize)*(ny as usize)*(nz as usize)]
		}
	}

	pub fn new_volume(nx: u32, ny: u32, nz: u32) -> Self {
		let mut mrc = Self::new(nx, ny, nz);
		mrc.set_layout(Layout::Volume);
		mrc
	}

	pub fn nx(&self) -> u32 {
		self.nx
	}

	pub fn ny(&self) -> u32 {
		self.ny
	}

	/// number of images in the stack
	pub fn nz(&self) -> u32 {
		self.nz
	}

	pub fn pixel_size(&self) -> f32 {
		self.pixel_size
	}

	pub fn set_pixel_size(&mut self, pixel_size: f32) {
		self.pixel_size = pixel_size;
	}

	/// Volume stacks are treated as image stacks
	pub fn layout(&self) -> Layout {
		if self.nz == 1 {
			return Layout::Image;
		}
		match self.space_group {
			0 ..= 230 if self.mz != 1 => Layout::Volume,
			_ => Layout::ImageStack
		}
	}

	pub fn set_layout(&mut self, layout: Layout) {
		match layout {
			Layout::Image | Layout::ImageStack => {
				self.space_group = 0;
				self.mz = 1;
			}
			Layout::Volume => {
				self.space_group = 1;
				self.mz = self.nz;
			}
		}
	}

	fn image_len(&self) -> usize {
		(self.nx as usize)*(self.ny as usize)
	}

	fn index(&self, x: u32, y: u32, z: u32) -> usize {
		let x = x as usize;
		let y = y as usize;
		let z = z as usize;
		let nx = self.nx as usize;
		let ny = self.ny as usize;
		z*nx*ny + y*nx + x
	}

	pub fn get(&self, x: u32, y: u32, z: u32) -> f32 {
		self.voxels[self.index(x, y, z)]
	}

	pub fn set(&mut self, x: u32, y: u32, z: u32, val: f32) {
		let i = self.index(x, y, z);
		self.voxels[i] = val;
	}

	/// the z-th image, in y(x) order
	pub fn image(&self, z: u32) -> &[f32] {
		let len = self.image_len();
		let start = (z as usize)*len;
		&self.voxels[start .. start + len]
	}

	pub fn image_mut(&mut self, z: u32) -> &mut [f32] {
		let len = self.image_len();
		let start = (z as usize)*len;
		&mut self.voxels[start .. start + len]
	}

	/// all the voxels, in z(y(x)) order
	pub fn voxels(&self) -> &[f32] {
		&self.voxels
	}

	pub fn voxels_mut(&mut self) -> &mut [f32] {
		&mut self.voxels
	}

	pub fn read(path: impl AsRef<Path>) -> Result<Self> {

		let path = path.as_ref();

		let file = File::open(&path)
			.context(format!("Failed to open file for reading: {}", path.to_string_lossy()))?;
		let mut reader = BufReader::new(file);

		let mut header = [0u8; HEADER_BYTES];
		reader.read_exact(&mut header)
			.context(format!("Failed to read MRC header: {}", path.to_string_lossy()))?;

		// the machine stamp (word 54) tells us the byte order: 0x44 for little-endian, 0x11 for big-endian
		let mrc = match header[4*53] {
			0x11 => Self::read_body::<BE>(&header, &mut reader),
			_ => Self::read_body::<LE>(&header, &mut reader)
		};
		mrc.context(format!("Failed to read MRC file: {}", path.to_string_lossy()))
	}

	fn read_body<B: ByteOrder>(header: &[u8], reader: &mut impl Read) -> Result<Self> {

		// header words are 1-based in the MRC2014 docs
		let word_i32 = |word: usize| B::read_i32(&header[4*(word - 1) .. 4*word]);
		let word_f32 = |word: usize| B::read_f32(&header[4*(word - 1) .. 4*word]);

		let (nx, ny, nz) = (word_i32(1), word_i32(2), word_i32(3));
		if nx <= 0 || ny <= 0 || nz <= 0 {
			bail!("Invalid MRC dimensions: {}x{}x{}", nx, ny, nz);
		}
		let (nx, ny, nz) = (nx as u32, ny as u32, nz as u32);
		let mode = word_i32(4);

		// pixel size is the cell size over the sampling
		let mx = word_i32(8);
		let cella_x = word_f32(11);
		let pixel_size =
			if mx > 0 && cella_x > 0.0 {
				cella_x/(mx as f32)
			} else {
				1.0
			};

		let mz = word_i32(10);
		let space_group = word_i32(23);

		// skip the extended header, if any
		let nsymbt = word_i32(24);
		if nsymbt > 0 {
			let mut extended = vec![0u8; nsymbt as usize];
			reader.read_exact(&mut extended)
				.context("Failed to read extended header")?;
		}

		let mut mrc = Self::new(nx, ny, nz);
		mrc.pixel_size = pixel_size;
		mrc.space_group = space_group;
		mrc.mz = mz.max(0) as u32;
		let n = mrc.voxels.len();

		match mode {
			0 => {
				let mut buf = vec![0i8; n];
				reader.read_i8_into(&mut buf)?;
				mrc.voxels = buf.into_iter().map(f32::from).collect();
			}
			1 => {
				let mut buf = vec![0i16; n];
				reader.read_i16_into::<B>(&mut buf)?;
				mrc.voxels = buf.into_iter().map(f32::from).collect();
			}
			2 => reader.read_f32_into::<B>(&mut mrc.voxels)?,
			6 => {
				let mut buf = vec![0u16; n];
				reader.read_u16_into::<B>(&mut buf)?;
				mrc.voxels = buf.into_iter().map(f32::from).collect();
			}
			_ => bail!("Unsupported MRC mode: {}", mode)
		}

		Ok(mrc)
	}

	pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {

		let path = path.as_ref();

		let mut file = File::create(&path)
			.context(format!("Failed to open file for writing: {}", path.to_string_lossy()))?;
		let mut writer = BufWriter::new(&mut file);

		// first, write the header: it's 256 (4-byte) words, or 1024 bytes total
		// NOTE: always write Little-Endian, regardless of how the file was read

		// write the dimensions (words 1-3)
		writer.write_u32::<LE>(self.nx)?;
		writer.write_u32::<LE>(self.ny)?;
		writer.write_u32::<LE>(self.nz)?;

		// use mode 2: 32 bit float
		writer.write_u32::<LE>(2)?;

		// start indices (words 5-7)
		writer.write_all(&[0u8; 4*3])?;

		// sampling (words 8-10), then cell dimensions in Angstroms (words 11-13)
		// image stacks sample z once, so the cell is one section deep
		let mz =
			if self.layout() == Layout::Volume {
				self.nz
			} else {
				1
			};
		writer.write_u32::<LE>(self.nx)?;
		writer.write_u32::<LE>(self.ny)?;
		writer.write_u32::<LE>(mz)?;
		writer.write_f32::<LE>(self.nx as f32*self.pixel_size)?;
		writer.write_f32::<LE>(self.ny as f32*self.pixel_size)?;
		writer.write_f32::<LE>(mz as f32*self.pixel_size)?;

		// cell angles (words 14-16), then axis mapping (words 17-19)
		for _ in 0 .. 3 {
			writer.write_f32::<LE>(90.0)?;
		}
		for axis in 1 ..= 3 {
			writer.write_u32::<LE>(axis)?;
		}

		// density stats (words 20-22)
		let (min, max, mean) = self.stats();
		writer.write_f32::<LE>(min)?;
		writer.write_f32::<LE>(max)?;
		writer.write_f32::<LE>(mean)?;

		// space group (word 23), no extended header (word 24)
		let space_group =
			if self.layout() == Layout::Volume {
				1
			} else {
				0
			};
		writer.write_u32::<LE>(space_group)?;
		writer.write_u32::<LE>(0)?;

		// we're at word 25 now: skip to word 53
		writer.write_all(&[0u8; 4*(53 - 25)])?;

		// the MAP marker (word 53), and the machine stamp for little-endianess (word 54)
		writer.write_all(b"MAP ")?;
		writer.write_all(&[0x44, 0x44, 0x00, 0x00])?;

		// we're at word 55 now: skip to the end of the header (word 257)
		writer.write_all(&[0u8; 4*(257 - 55)])?;

		// write the voxels: z(y(x)) order
		for &v in &self.voxels {
			writer.write_f32::<LE>(v)?;
		}

		// write buffers should be flushed before dropping
		writer.flush()?;

		Ok(())
	}

	fn stats(&self) -> (f32, f32, f32) {
		if self.voxels.is_empty() {
			return (0.0, 0.0, 0.0);
		}
		let mut min = f32::INFINITY;
		let mut max = f32::NEG_INFINITY;
		let mut sum = 0f64;
		for &v in &self.voxels {
			min = min.min(v);
			max = max.max(v);
			sum += v as f64;
		}
		(min, max, (sum/(self.voxels.len() as f64)) as f32)
	}
}


/// eg `path/tomo.st` with `dw` becomes `path/tomo_dw.st`
pub fn appended_path(path: impl AsRef<Path>, append: &str) -> PathBuf {
	let path = path.as_ref();
	let stem = path.file_stem()
		.map(|s| s.to_string_lossy().to_string())
		.unwrap_or_default();
	let filename = match path.extension() {
		Some(ext) => format!("{}_{}.{}", stem, append, ext.to_string_lossy()),
		None => format!("{}_{}", stem, append)
	};
	path.with_file_name(filename)
}
