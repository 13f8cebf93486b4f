use half::f16;
use linear_quants::{Parallelism, QuantPolicy};
use log::info;
use memmap2::Mmap;
use std::{borrow::Cow, fs::File, io, path::PathBuf, time::Instant};

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum DType {
    F32,
    F16,
}

impl DType {
    #[inline]
    pub fn size(self) -> usize {
        match self {
            Self::F32 => size_of::<f32>(),
            Self::F16 => size_of::<f16>(),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum QType {
    I8,
    U8,
    I16,
    U16,
    Int4,
    Uint4,
}

#[derive(Args)]
pub(crate) struct QuantArgs {
    /// Raw little-endian tensor dump
    pub file: PathBuf,
    /// Element type of the dump
    #[clap(long, value_enum, default_value = "f32")]
    pub dtype: DType,
    /// Quantized element type
    #[clap(long, value_enum, default_value = "u8")]
    pub qtype: QType,
    /// Pin the zero point to 0 (signed types only)
    #[clap(long)]
    pub symmetric: bool,
    /// Use the reduced range of the quantized type
    #[clap(long)]
    pub reduce_range: bool,
    /// Worker threads, 0 to stay on the main thread. Defaults to the global pool
    #[clap(long)]
    pub threads: Option<usize>,
}

pub(crate) struct Tensor {
    dtype: DType,
    data: Mmap,
}

impl QuantArgs {
    pub fn policy(&self) -> QuantPolicy {
        QuantPolicy {
            reduce_range: self.reduce_range,
            symmetric: self.symmetric,
        }
    }

    pub fn load(&self) -> io::Result<Tensor> {
        let file = File::open(&self.file)?;
        let data = unsafe { Mmap::map(&file) }?;
        let size = self.dtype.size();
        if data.len() % size != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} bytes is not a whole number of {size}-byte elements", data.len()),
            ));
        }
        info!("mapped {} ({} bytes)", self.file.display(), data.len());
        Ok(Tensor {
            dtype: self.dtype,
            data,
        })
    }

    /// Runs `f` with the parallelism asked for on the command line.
    pub fn with_parallelism<R>(&self, f: impl FnOnce(Parallelism) -> R) -> R {
        match self.threads {
            None => f(Parallelism::Global),
            Some(0) => f(Parallelism::Serial),
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .unwrap();
                f(Parallelism::Pool(&pool))
            }
        }
    }
}

impl Tensor {
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn f16s(&self) -> Option<&[f16]> {
        match self.dtype {
            DType::F16 => Some(reslice(&self.data)),
            DType::F32 => None,
        }
    }

    pub fn f32s(&self) -> Cow<[f32]> {
        match self.dtype {
            DType::F32 => Cow::Borrowed(reslice(&self.data)),
            DType::F16 => {
                let time = Instant::now();
                let ans = reslice::<f16>(&self.data)
                    .iter()
                    .map(|x| x.to_f32())
                    .collect();
                info!("widen f16 in {:?}", time.elapsed());
                Cow::Owned(ans)
            }
        }
    }
}

#[inline]
fn reslice<T>(data: &[u8]) -> &[T] {
    let ([], data, []) = (unsafe { data.align_to() }) else {
        panic!("data is not aligned");
    };
    data
}
