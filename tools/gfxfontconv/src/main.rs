use anyhow::{bail, Context, Result};
use clap::Parser;
use libgfxfont::{autocrop, to_gfx_string, CharRange, ConvertOptions, FontModel, FontStyle, RawRaster, Rasterizer};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const PREVIEW_CHARS: &str = " AWyÄÖÜäöüß!.";

/// Converts a font into an Adafruit GFX font header (`<name>.h`).
///
/// Exactly one of --fon, --ttf or --family selects the source.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Windows FON bitmap font to convert.
    #[arg(short = 'b', long, value_name = "FON", conflicts_with_all = ["ttf", "family"], required_unless_present_any = ["ttf", "family"])]
    fon: Option<PathBuf>,

    /// Outline font file (TTF, OTF) to convert.
    #[arg(short = 'n', long, value_name = "TTF", conflicts_with = "family")]
    ttf: Option<PathBuf>,

    /// Name of an installed font family to convert.
    #[arg(short, long)]
    family: Option<String>,

    /// Folder the header file is written to.
    #[arg(short = 'p', long, default_value = ".")]
    out_dir: PathBuf,

    /// Size in points. Ignored for FON fonts.
    #[arg(short, long, default_value_t = 7.0)]
    size: f32,

    /// Bold, Italic, Underline, Strikeout or Regular; combine with '+', e.g. Bold+Italic.
    #[arg(short = 'a', long, default_value = "Regular")]
    style: FontStyle,

    /// 7 (0x20-0x7F), 8 (0x20-0xFF) or an explicit range such as 0x20-0x7E.
    #[arg(short, long, default_value = "8", value_parser = parse_range)]
    range: CharRange,

    /// Resolution outline fonts are rendered at.
    #[arg(long, default_value_t = 96)]
    dpi: u32,

    /// Keep glyphs at their full cell size instead of cropping them.
    #[arg(long)]
    preserve_cell_box: bool,

    /// Line advance of outline fonts as a multiple of the height of 'W'.
    #[arg(long, default_value_t = 1.0)]
    line_advance_factor: f32,

    /// Font to convert when the FON file holds several.
    #[arg(long, default_value_t = 0)]
    font_index: usize,

    /// Print crop margins and bitmaps of these characters instead of writing a header.
    #[arg(short = 't', long, value_name = "CHARS", num_args = 0..=1, default_missing_value = PREVIEW_CHARS)]
    preview: Option<String>,

    /// Log debug output.
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let format = tracing_subscriber::fmt::format().compact();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(format)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_num(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex number '{s}': {e}"))
    } else {
        s.parse::<u32>()
            .map_err(|e| format!("Invalid decimal number '{s}': {e}"))
    }
}

fn parse_range(input: &str) -> Result<CharRange, String> {
    match input.trim() {
        "7" => Ok(CharRange::SEVEN_BIT),
        "8" => Ok(CharRange::EIGHT_BIT),
        range => {
            let Some((first, last)) = range.split_once('-') else {
                return Err(format!("Invalid range format: {range}"));
            };
            CharRange::new(parse_num(first)?, parse_num(last)?).map_err(|e| e.to_string())
        }
    }
}

impl Args {
    fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            range: self.range,
            preserve_cell_box: self.preserve_cell_box,
            line_advance_factor: self.line_advance_factor,
            font_index: self.font_index,
        }
    }
}

#[cfg(feature = "freetype")]
fn open_rasterizer(args: &Args) -> Result<Box<dyn Rasterizer>> {
    use libgfxfont::freetype::FreetypeRasterizer;

    let rasterizer = match (&args.ttf, &args.family) {
        (Some(path), _) => FreetypeRasterizer::from_file(path, args.size, args.dpi, args.style)
            .with_context(|| format!("cannot open '{}'", path.display()))?,
        (None, Some(family)) => FreetypeRasterizer::from_family(family, args.size, args.dpi, args.style)
            .with_context(|| format!("cannot open font family '{family}'"))?,
        (None, None) => bail!("Neither --fon, --ttf nor --family has been specified"),
    };
    Ok(Box::new(rasterizer))
}

#[cfg(not(feature = "freetype"))]
fn open_rasterizer(args: &Args) -> Result<Box<dyn Rasterizer>> {
    bail!(
        "outline fonts ({}pt {:?} at {} dpi) need gfxfontconv built with the 'freetype' feature",
        args.size,
        args.style,
        args.dpi
    )
}

fn convert(args: &Args) -> Result<FontModel> {
    let options = args.convert_options();
    debug!("converting with {options:?}");
    match &args.fon {
        Some(path) => FontModel::from_fon_path(path, &options)
            .with_context(|| format!("cannot convert '{}'", path.display())),
        None => {
            let mut rasterizer = open_rasterizer(args)?;
            FontModel::from_rasterizer(rasterizer.as_mut(), &options).context("cannot convert outline font")
        }
    }
}

/// Writes `<out_dir>/<name>.h`; the header only appears once it is complete.
fn write_header(font: &FontModel, out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(format!("{}.h", font.name));
    let partial = path.with_extension("h.partial");
    std::fs::write(&partial, to_gfx_string(font))
        .with_context(|| format!("cannot write '{}'", partial.display()))?;
    std::fs::rename(&partial, &path).with_context(|| format!("cannot write '{}'", path.display()))?;
    Ok(path)
}

fn print_preview(c: char, cell: &RawRaster) {
    let (margins, cropped) = autocrop(cell, false);
    if margins.is_blank() {
        println!("'{c}' (0x{:02x}): blank {}x{} cell", c as u32, cell.width(), cell.height());
        return;
    }
    println!(
        "'{c}' (0x{:02x}): left {}, right {}, top {}, bottom {}, {}x{}",
        c as u32,
        margins.left,
        margins.right,
        margins.top,
        margins.bottom,
        cropped.width(),
        cropped.height()
    );
    print!("{cropped}");
}

fn preview(args: &Args, chars: &str) -> Result<()> {
    match &args.fon {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("cannot open '{}'", path.display()))?;
            let mut fonts = libgfxfont::fon::decode(&mut BufReader::new(file))
                .with_context(|| format!("cannot decode '{}'", path.display()))?;
            if args.font_index >= fonts.len() {
                bail!("font index {} out of range, file holds {} font(s)", args.font_index, fonts.len());
            }
            let font = fonts.swap_remove(args.font_index);
            info!("{} ({}x{})", font.face_name, font.cell_width(), font.cell_height());
            for c in chars.chars() {
                match u8::try_from(u32::from(c)).ok().and_then(|code| font.glyph(code)) {
                    Some(glyph) => print_preview(c, &glyph.raster),
                    None => warn!("'{c}' is not part of the font"),
                }
            }
        }
        None => {
            let mut rasterizer = open_rasterizer(args)?;
            info!("{} {}pt", rasterizer.family_name(), rasterizer.point_size());
            for c in chars.chars() {
                let cell = libgfxfont::rasterizer::render_cell(rasterizer.as_mut(), c)?;
                print_preview(c, &cell);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Some(chars) = &args.preview {
        return preview(&args, chars);
    }

    let font = convert(&args)?;
    let path = write_header(&font, &args.out_dir)?;
    info!("Font file successfully created: {}", path.display());
    Ok(())
}
