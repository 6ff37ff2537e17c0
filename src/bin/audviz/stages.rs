//! Pipeline stages backed by the real engine and input device.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;
use tracing::{info, warn};

use audviz::{
    engine::{source::BufferPlayer, Patchbay, SourceFeed},
    graph::{PlayerGraph, VisualizationMode},
    media::{self, DecodedAudio, SourceSpec},
    playback::{LoadedMedia, PipelineStages},
    Error, Result,
};

/// Seconds of microphone audio buffered between the input and output callbacks.
const INPUT_RING_SECONDS: f32 = 0.5;

pub struct DeviceStages {
    graph: PlayerGraph<Patchbay>,
    mode: VisualizationMode,
    input: Option<cpal::Stream>,
}

impl DeviceStages {
    pub fn new(graph: PlayerGraph<Patchbay>, mode: VisualizationMode) -> Self {
        Self {
            graph,
            mode,
            input: None,
        }
    }

    pub fn graph(&self) -> &PlayerGraph<Patchbay> {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut PlayerGraph<Patchbay> {
        &mut self.graph
    }

    /// Remember `mode` and rewire now if a source is already connected.
    pub fn set_mode(&mut self, mode: VisualizationMode) {
        self.mode = mode;
        // Wiring failures are logged by the graph and leave the old wiring.
        let _ = self.graph.set_visualization(mode);
    }

    fn open_input(&mut self) -> Result<SourceFeed> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::SourceUnavailable("no default input device".into()))?;
        let config = device
            .default_input_config()
            .map_err(|err| Error::SourceUnavailable(err.to_string()))?;

        let input_rate = config.sample_rate().0 as f32;
        let output_rate = self.graph.engine().sample_rate();
        if (input_rate - output_rate).abs() > f32::EPSILON {
            warn!(input_rate, output_rate, "input and output rates differ; playing unresampled");
        }

        let channels = usize::from(config.channels()).max(1);
        let capacity = (output_rate * INPUT_RING_SECONDS) as usize;
        let (mut tx, rx) = RingBuffer::<[f32; 2]>::new(capacity.max(1024));

        let stream = device
            .build_input_stream(
                &config.into(),
                move |data: &[f32], _| {
                    for frame in data.chunks_exact(channels) {
                        let left = frame[0];
                        let right = frame.get(1).copied().unwrap_or(left);
                        // Drop on overflow; the output side catches up with silence.
                        if tx.push([left, right]).is_err() {
                            break;
                        }
                    }
                },
                |err| warn!("input stream error: {err}"),
                None,
            )
            .map_err(|err| Error::SourceUnavailable(err.to_string()))?;
        stream
            .play()
            .map_err(|err| Error::SourceUnavailable(err.to_string()))?;

        info!(device = ?device.name().ok(), channels, "microphone opened");
        self.input = Some(stream);
        Ok(SourceFeed::Stream(rx))
    }
}

impl PipelineStages for DeviceStages {
    fn load(&mut self, source: &SourceSpec) -> Result<LoadedMedia> {
        match source {
            SourceSpec::Microphone => Ok(LoadedMedia::Stream),
            SourceSpec::File(path) => media::load(path).map(LoadedMedia::Bytes),
        }
    }

    fn decode(&mut self, bytes: Vec<u8>) -> Result<DecodedAudio> {
        let audio = media::decode(&bytes)?;
        info!(
            sample_rate = audio.sample_rate,
            seconds = audio.duration(),
            "decoded"
        );
        Ok(audio)
    }

    fn connect(&mut self, audio: Option<DecodedAudio>) -> Result<()> {
        let feed = match audio {
            Some(audio) => {
                let rate = self.graph.engine().sample_rate();
                SourceFeed::Buffer(BufferPlayer::new(Arc::new(audio), rate))
            }
            None => self.open_input()?,
        };
        self.graph
            .engine_mut()
            .set_source(feed)
            .map_err(|err| Error::SourceUnavailable(err.to_string()))?;
        let _ = self.graph.set_visualization(self.mode);
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.graph.engine_mut().set_playing(true)
    }

    fn set_paused(&mut self, paused: bool) -> Result<()> {
        self.graph.engine_mut().set_playing(!paused)
    }
}
