//! Command-line options for the `chordloop` binary.

pub const USAGE: &str = "\
usage: chordloop [options] <chord>...

  chords are names like C, Am7, F#m7b5, Cmaj7/E, or a bare quality (m7)
  resolved in --key

options:
  --midi-port <name>   send to the first MIDI output whose name contains <name>
  --channel <1-16>     MIDI channel (default 1)
  --list-ports         list MIDI output ports and exit
  --list-presets       list pattern presets and exit
  --bpm <n>            tempo, 20-300
  --pattern <notation> global pattern, e.g. \"1 2 3 x\" or \"1&3 2+\"
  --preset <name>      global pattern from a preset
  --key <name>         key for bare qualities and --scale (default from config)
  --mode <name>        mode for --scale
  --loops <n>          passes through the progression (default 1)
  --scale              play the current scale once and exit
  --sustain            hold chord tones until the chord changes
  --octave <n>         shift everything by n octaves (-3..3)
  -v, --verbose        debug logging
  --log-stderr         log to the terminal instead of the log file
  -h, --help           show this text
";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliArgs {
    pub midi_port: Option<String>,
    /// Zero-based.
    pub channel: u8,
    pub list_ports: bool,
    pub list_presets: bool,
    pub bpm: Option<f32>,
    pub pattern: Option<String>,
    pub preset: Option<String>,
    pub key: Option<String>,
    pub mode: Option<String>,
    pub loops: u32,
    pub scale: bool,
    pub sustain: bool,
    pub octave: Option<i32>,
    pub verbose: bool,
    pub log_stderr: bool,
    pub help: bool,
    pub chords: Vec<String>,
}

impl CliArgs {
    /// Parse everything after the program name.
    pub fn parse<I, S>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = CliArgs { loops: 1, ..Default::default() };
        let mut iter = args.into_iter().map(Into::into);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--midi-port" => out.midi_port = Some(value(&arg, iter.next())?),
                "--channel" => {
                    let channel: u8 = number(&arg, iter.next())?;
                    if !(1..=16).contains(&channel) {
                        return Err(format!("--channel must be 1-16, got {}", channel));
                    }
                    out.channel = channel - 1;
                }
                "--list-ports" => out.list_ports = true,
                "--list-presets" => out.list_presets = true,
                "--bpm" => out.bpm = Some(number(&arg, iter.next())?),
                "--pattern" => out.pattern = Some(value(&arg, iter.next())?),
                "--preset" => out.preset = Some(value(&arg, iter.next())?),
                "--key" => out.key = Some(value(&arg, iter.next())?),
                "--mode" => out.mode = Some(value(&arg, iter.next())?),
                "--loops" => out.loops = number(&arg, iter.next())?,
                "--scale" => out.scale = true,
                "--sustain" => out.sustain = true,
                "--octave" => out.octave = Some(number(&arg, iter.next())?),
                "--verbose" | "-v" => out.verbose = true,
                "--log-stderr" => out.log_stderr = true,
                "--help" | "-h" => out.help = true,
                flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
                _ => out.chords.push(arg),
            }
        }
        if out.pattern.is_some() && out.preset.is_some() {
            return Err("--pattern and --preset are mutually exclusive".into());
        }
        Ok(out)
    }
}

fn value(flag: &str, next: Option<String>) -> Result<String, String> {
    next.ok_or_else(|| format!("{} needs a value", flag))
}

fn number<T: std::str::FromStr>(flag: &str, next: Option<String>) -> Result<T, String> {
    let raw = value(flag, next)?;
    raw.trim()
        .parse()
        .map_err(|_| format!("{} expects a number, got {:?}", flag, raw))
}
