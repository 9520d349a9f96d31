// ============================================================
// Layer 6 — Export Store (ONNX)
// ============================================================
// Writes the generator, in evaluation mode, as a static ONNX graph:
//
//   input [batch, 3, S, S]
//     → Conv → (BatchNormalization) → LeakyRelu        × depth
//     → ConvTranspose → BatchNormalization → Relu
//       → Concat(skip)                                 × depth-1
//     → ConvTranspose → Tanh
//   output [batch, 3, S, S]
//
// Dropout is the identity in evaluation mode and is left out.
// Batch norm is exported with its running statistics.
//
// The generator is traced once on a zero input of the export size
// before anything is serialised; a shape problem fails the export
// without touching the file system. Files are written to
// `generator_epoch_XXX.onnx.tmp` and renamed into place.
//
// IR version 8, opset 13.

use burn::{
    nn::{
        conv::{Conv2d, ConvTranspose2d},
        BatchNorm,
    },
    prelude::*,
};
use onnx_pb::{
    attribute_proto::AttributeType,
    tensor_proto::DataType,
    tensor_shape_proto::{self, dimension},
    type_proto, AttributeProto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto,
    TensorProto, TensorShapeProto, TypeProto, ValueInfoProto,
};
use prost::Message;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::{Result, TrainError};
use crate::domain::image::CHANNELS;
use crate::infra::remove_matching;
use crate::ml::generator::{Generator, KERNEL, LEAKY_SLOPE, NORM_EPSILON, PADDING, STRIDE};

pub const INPUT_NAME:  &str = "input";
pub const OUTPUT_NAME: &str = "output";
pub const BATCH_AXIS:  &str = "batch";

const IR_VERSION: i64 = 8;
const OPSET:      i64 = 13;

pub struct ExportStore {
    dir: PathBuf,
}

impl ExportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| TrainError::setup(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn artifact_name(epoch: usize) -> String {
        format!("generator_epoch_{epoch:03}.onnx")
    }

    /// Delete every exported generator, including leftover temporary files.
    pub fn discard_all(&self) -> Result<usize> {
        remove_matching(&self.dir, |name| {
            name.starts_with("generator_epoch_") && (name.ends_with(".onnx") || name.ends_with(".onnx.tmp"))
        })
    }

    /// Export `generator` (already in evaluation mode) for `epoch` with a
    /// fixed spatial size of `size` pixels.
    pub fn export<B: Backend>(
        &self,
        generator: &Generator<B>,
        epoch:     usize,
        size:      usize,
        device:    &B::Device,
    ) -> Result<PathBuf> {
        let path = self.dir.join(Self::artifact_name(epoch));

        let multiple = generator.size_multiple();
        if size == 0 || size % multiple != 0 {
            return Err(TrainError::export(
                &path,
                format!("export size {size} is not a positive multiple of {multiple}"),
            ));
        }

        trace(generator, size, device).map_err(|reason| TrainError::export(&path, reason))?;
        let model = build_model(generator, size)?;

        let mut buf = Vec::with_capacity(model.encoded_len());
        model.encode(&mut buf).map_err(|e| TrainError::export(&path, e))?;

        let tmp = path.with_extension("onnx.tmp");
        fs::write(&tmp, &buf).map_err(|e| TrainError::export(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| TrainError::export(&path, e))?;

        tracing::debug!("Exported generator to '{}' ({} bytes)", path.display(), buf.len());
        Ok(path)
    }
}

/// Run the generator once on zeros and check the output shape.
fn trace<B: Backend>(generator: &Generator<B>, size: usize, device: &B::Device) -> std::result::Result<(), String> {
    let trace_input = Tensor::<B, 4>::zeros([1, CHANNELS, size, size], device);
    let dims = generator.forward(trace_input).dims();
    if dims != [1, CHANNELS, size, size] {
        return Err(format!("traced output {dims:?}, expected [1, {CHANNELS}, {size}, {size}]"));
    }
    Ok(())
}

fn build_model<B: Backend>(generator: &Generator<B>, size: usize) -> Result<ModelProto> {
    let mut graph = GraphBuilder::default();

    let mut x = INPUT_NAME.to_string();
    let mut skips = Vec::with_capacity(generator.downs.len());
    for (i, down) in generator.downs.iter().enumerate() {
        let name = format!("down{i}");
        x = graph.conv(&down.conv, &x, &format!("{name}.conv"))?;
        if let Some(norm) = &down.norm {
            x = graph.batch_norm(norm, &x, &format!("{name}.norm"))?;
        }
        x = graph.leaky_relu(&x, &name);
        skips.push(x.clone());
    }
    skips.pop();

    for (k, (up, skip)) in generator.ups.iter().zip(skips.into_iter().rev()).enumerate() {
        let name = format!("up{k}");
        x = graph.conv_transpose(&up.conv, &x, &format!("{name}.conv"))?;
        x = graph.batch_norm(&up.norm, &x, &format!("{name}.norm"))?;
        x = graph.unary("Relu", &x, &format!("{name}.relu"));
        x = graph.concat(&[x, skip], &name);
    }

    x = graph.conv_transpose(&generator.head, &x, "head")?;
    graph.unary_into("Tanh", &x, OUTPUT_NAME);

    let spatial = size as i64;
    let proto = GraphProto {
        name: "pix2pix_generator".into(),
        node: graph.nodes,
        initializer: graph.initializers,
        input: vec![image_value_info(INPUT_NAME, spatial)],
        output: vec![image_value_info(OUTPUT_NAME, spatial)],
        ..Default::default()
    };

    Ok(ModelProto {
        ir_version: IR_VERSION,
        producer_name: env!("CARGO_PKG_NAME").into(),
        producer_version: env!("CARGO_PKG_VERSION").into(),
        graph: Some(proto),
        opset_import: vec![OperatorSetIdProto { domain: String::new(), version: OPSET }],
        ..Default::default()
    })
}

/// `[batch, 3, size, size]` float tensor, batch left symbolic.
fn image_value_info(name: &str, size: i64) -> ValueInfoProto {
    let dim = |value| tensor_shape_proto::Dimension { value: Some(value), ..Default::default() };
    let shape = TensorShapeProto {
        dim: vec![
            dim(dimension::Value::DimParam(BATCH_AXIS.into())),
            dim(dimension::Value::DimValue(CHANNELS as i64)),
            dim(dimension::Value::DimValue(size)),
            dim(dimension::Value::DimValue(size)),
        ],
    };
    ValueInfoProto {
        name: name.into(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: DataType::Float as i32,
                shape:     Some(shape),
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[derive(Default)]
struct GraphBuilder {
    nodes:        Vec<NodeProto>,
    initializers: Vec<TensorProto>,
}

impl GraphBuilder {
    fn initializer<B: Backend, const D: usize>(&mut self, name: String, tensor: Tensor<B, D>) -> Result<String> {
        let dims = tensor.dims().iter().map(|&d| d as i64).collect();
        let float_data = tensor
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| TrainError::Tensor(format!("{e:?}")))?;
        self.initializers.push(TensorProto {
            name: name.clone(),
            data_type: DataType::Float as i32,
            dims,
            float_data,
            ..Default::default()
        });
        Ok(name)
    }

    fn conv<B: Backend>(&mut self, conv: &Conv2d<B>, input: &str, output: &str) -> Result<String> {
        let mut inputs = vec![input.to_string(), self.initializer(format!("{output}.weight"), conv.weight.val())?];
        if let Some(bias) = &conv.bias {
            inputs.push(self.initializer(format!("{output}.bias"), bias.val())?);
        }
        self.push("Conv", inputs, output, resampling_attributes());
        Ok(output.to_string())
    }

    fn conv_transpose<B: Backend>(&mut self, conv: &ConvTranspose2d<B>, input: &str, output: &str) -> Result<String> {
        let mut inputs = vec![input.to_string(), self.initializer(format!("{output}.weight"), conv.weight.val())?];
        if let Some(bias) = &conv.bias {
            inputs.push(self.initializer(format!("{output}.bias"), bias.val())?);
        }
        self.push("ConvTranspose", inputs, output, resampling_attributes());
        Ok(output.to_string())
    }

    fn batch_norm<B: Backend>(&mut self, norm: &BatchNorm<B, 2>, input: &str, output: &str) -> Result<String> {
        let inputs = vec![
            input.to_string(),
            self.initializer(format!("{output}.scale"), norm.gamma.val())?,
            self.initializer(format!("{output}.bias"), norm.beta.val())?,
            self.initializer(format!("{output}.mean"), norm.running_mean.value())?,
            self.initializer(format!("{output}.var"), norm.running_var.value())?,
        ];
        self.push("BatchNormalization", inputs, output, vec![float_attribute("epsilon", NORM_EPSILON)]);
        Ok(output.to_string())
    }

    fn leaky_relu(&mut self, input: &str, output: &str) -> String {
        self.push("LeakyRelu", vec![input.to_string()], output, vec![float_attribute("alpha", LEAKY_SLOPE)]);
        output.to_string()
    }

    fn concat(&mut self, inputs: &[String], output: &str) -> String {
        let axis = AttributeProto {
            name: "axis".into(),
            r#type: AttributeType::Int as i32,
            i: 1,
            ..Default::default()
        };
        self.push("Concat", inputs.to_vec(), output, vec![axis]);
        output.to_string()
    }

    fn unary(&mut self, op: &str, input: &str, output: &str) -> String {
        self.unary_into(op, input, output);
        output.to_string()
    }

    fn unary_into(&mut self, op: &str, input: &str, output: &str) {
        self.push(op, vec![input.to_string()], output, Vec::new());
    }

    fn push(&mut self, op: &str, input: Vec<String>, output: &str, attribute: Vec<AttributeProto>) {
        self.nodes.push(NodeProto {
            op_type: op.into(),
            name: output.into(),
            input,
            output: vec![output.into()],
            attribute,
            ..Default::default()
        });
    }
}

fn ints_attribute(name: &str, values: [usize; 2]) -> AttributeProto {
    AttributeProto {
        name: name.into(),
        r#type: AttributeType::Ints as i32,
        ints: values.iter().map(|&v| v as i64).collect(),
        ..Default::default()
    }
}

fn float_attribute(name: &str, value: f64) -> AttributeProto {
    AttributeProto {
        name: name.into(),
        r#type: AttributeType::Float as i32,
        f: value as f32,
        ..Default::default()
    }
}

/// Every resampling layer of the generator is 4x4, stride 2, padding 1.
fn resampling_attributes() -> Vec<AttributeProto> {
    let mut pads = ints_attribute("pads", [PADDING, PADDING]);
    pads.ints.extend_from_within(..);
    vec![
        ints_attribute("kernel_shape", [KERNEL, KERNEL]),
        ints_attribute("strides", [STRIDE, STRIDE]),
        pads,
    ]
}

/// Decode an exported file. Used by tests and by anyone validating output.
pub fn read_model(path: &Path) -> Result<ModelProto> {
    let bytes = fs::read(path)?;
    ModelProto::decode(bytes.as_slice()).map_err(|e| TrainError::export(path, e))
}
