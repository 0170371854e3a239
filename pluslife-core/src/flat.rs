//! Semicolon-delimited sample lines used for compact logs:
//! `samplingTime;startingChannel;firstChannelResult;samplingTemperature`.
//!
//! The format is lossy. Reading a line back restores the four measured fields
//! and leaves everything else at the sample defaults.

use crate::{error::PluslifeError, sample::FluorescenceSample};
use csv::{ReaderBuilder, Writer, WriterBuilder};
use std::{fs, io, path::Path};

/// Positional layout of one line. `samplingTime` may be written as `1250.0`
/// and is truncated to whole tenths of a second.
type FlatSampleLine = (f64, u32, i64, f64);

fn from_fields(
    (time, channel, value, temperature): FlatSampleLine,
) -> Result<FluorescenceSample, PluslifeError> {
    if !time.is_finite() || time < 0.0 || time > u32::MAX as f64 {
        return Err(PluslifeError::InvalidFlatField("samplingTime", time.to_string()));
    }
    Ok(FluorescenceSample::new(channel, time.trunc() as u32, temperature, value))
}

fn flat_fields(sample: &FluorescenceSample) -> [String; 4] {
    [
        sample.sampling_time.to_string(),
        sample.starting_channel.to_string(),
        sample.first_channel_result.to_string(),
        sample.sampling_temperature.to_string(),
    ]
}

fn flat_reader<R: io::Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

pub fn to_flat_line(sample: &FluorescenceSample) -> String {
    flat_fields(sample).join(";")
}

pub fn from_flat_line(line: &str) -> Result<FluorescenceSample, PluslifeError> {
    let mut reader = flat_reader(line.as_bytes());
    match reader.deserialize::<FlatSampleLine>().next() {
        Some(Ok(parsed)) => from_fields(parsed),
        Some(Err(e)) => Err(PluslifeError::FlatLine(line.to_string(), e)),
        None => Err(PluslifeError::MissingRequiredField("FlatSampleLine", "samplingTime")),
    }
}

/// Reads every line of a flat sample log, in order.
pub fn read_flat_samples<R: io::Read>(reader: R) -> Result<Vec<FluorescenceSample>, PluslifeError> {
    let mut reader = flat_reader(reader);
    let mut samples = Vec::new();
    for (index, parsed) in reader.deserialize::<FlatSampleLine>().enumerate() {
        let parsed = parsed.map_err(|e| PluslifeError::FlatLine(format!("line {}", index + 1), e))?;
        samples.push(from_fields(parsed)?);
    }
    Ok(samples)
}

/// Appends samples to a flat log, one line each, flushing after every write.
pub struct FlatSampleLog<W: io::Write> {
    writer: Writer<W>,
}

impl FlatSampleLog<fs::File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, PluslifeError> {
        let writer = WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .from_path(path)
            .map_err(PluslifeError::FlatLog)?;
        Ok(Self { writer })
    }
}

impl<W: io::Write> FlatSampleLog<W> {
    pub fn new(inner: W) -> Self {
        let writer = WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .from_writer(inner);
        Self { writer }
    }

    pub fn log_sample(&mut self, sample: &FluorescenceSample) -> Result<(), PluslifeError> {
        self.writer
            .write_record(flat_fields(sample))
            .map_err(PluslifeError::FlatLog)?;
        self.writer
            .flush()
            .map_err(|e| PluslifeError::FlatLog(e.into()))?;
        Ok(())
    }

    pub fn log_samples<'a, I>(&mut self, samples: I) -> Result<usize, PluslifeError>
    where
        I: IntoIterator<Item = &'a FluorescenceSample>,
    {
        let mut written = 0;
        for sample in samples {
            self.log_sample(sample)?;
            written += 1;
        }
        Ok(written)
    }

    pub fn into_inner(self) -> Result<W, PluslifeError> {
        self.writer
            .into_inner()
            .map_err(|e| PluslifeError::FlatLog(e.into_error().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pluslife_schemas::enums::TestType;

    fn full_sample() -> FluorescenceSample {
        let mut sample = FluorescenceSample::new(4, 1250, 6312.5, 933);
        sample.sample_type = TestType::Unknown;
        sample.sample_stream_number = 3;
        sample.current_data_index = 17;
        sample.total_number_of_samples = 42;
        sample.number_of_channels = 7;
        sample
    }

    #[test]
    fn line_layout_is_time_channel_value_temperature() {
        assert_eq!(to_flat_line(&FluorescenceSample::new(4, 1250, 6300.0, 933)), "1250;4;933;6300");
        assert_eq!(to_flat_line(&full_sample()), "1250;4;933;6312.5");
    }

    #[test]
    fn flat_round_trip_keeps_measurements_and_resets_the_rest() {
        let original = full_sample();
        let back = from_flat_line(&to_flat_line(&original)).unwrap();

        assert_eq!(back.sampling_time, original.sampling_time);
        assert_eq!(back.starting_channel, original.starting_channel);
        assert_eq!(back.first_channel_result, original.first_channel_result);
        assert_eq!(back.sampling_temperature, original.sampling_temperature);

        assert_eq!(back.sample_type, TestType::SarsCov2);
        assert_eq!(back.sample_stream_number, 0);
        assert_eq!(back.current_data_index, 0);
        assert_eq!(back.total_number_of_samples, 1);
        assert_eq!(back.number_of_channels, 1);
    }

    #[test]
    fn short_line_is_rejected() {
        assert!(matches!(from_flat_line("1250;4;933"), Err(PluslifeError::FlatLine(..))));
        assert!(from_flat_line("").is_err());
    }

    #[test]
    fn log_writes_one_line_per_sample() {
        let samples = vec![
            FluorescenceSample::new(0, 100, 6300.0, 10),
            FluorescenceSample::new(1, 100, 6301.0, 11),
        ];
        let mut log = FlatSampleLog::new(Vec::new());
        assert_eq!(log.log_samples(&samples).unwrap(), 2);
        let bytes = log.into_inner().unwrap();

        assert_eq!(String::from_utf8(bytes.clone()).unwrap(), "100;0;10;6300\n100;1;11;6301\n");
        let back = read_flat_samples(bytes.as_slice()).unwrap();
        assert_eq!(back, samples);
    }

    #[test]
    fn decimal_sampling_time_is_accepted() {
        let sample = from_flat_line("1250.0;4;933;6300.0").unwrap();
        assert_eq!(sample.sampling_time, 1250);
        assert_eq!(sample.starting_channel, 4);
        assert_eq!(sample.first_channel_result, 933);
        assert_eq!(sample.sampling_temperature, 6300.0);
        assert_eq!(to_flat_line(&sample), "1250;4;933;6300");

        assert_eq!(from_flat_line("1250.7;4;933;6300").unwrap().sampling_time, 1250);
    }

    #[test]
    fn negative_sampling_time_is_rejected() {
        assert!(matches!(
            from_flat_line("-5;4;933;6300"),
            Err(PluslifeError::InvalidFlatField("samplingTime", _))
        ));
    }
}
