/*
 * Ticker-LSTM, a stock price forecasting workbench built on LSTM
 * Copyright (C) 2025 Athaariq A. Ramadhani <foss@athaariq.my.id>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

use burn::{
	module::AutodiffModule,
	nn::loss::{MseLoss, Reduction::Mean},
	optim::{GradientsParams, Optimizer},
	tensor::{
		backend::{AutodiffBackend, Backend},
		ElementConversion, Int, Tensor, TensorData,
	},
};
use ndarray::{Array2, ArrayD, ArrayView3};
use rand::{rngs::StdRng, seq::SliceRandom};

use super::model::*;
use super::typedef::*;
use crate::error::{ForecastError, Result};
use crate::preprocess::typedef::SegmentTensors;

pub(crate) fn inputs_to_tensor<B: Backend>(inputs: ArrayView3<'_, f64>, device: &B::Device) -> Tensor<B, 3> {
	let (count, steps, features) = inputs.dim();
	let flatten = inputs.iter().map(|each| *each as f32).collect::<Vec<_>>();
	Tensor::from_data(TensorData::new(flatten, [count, steps, features]), device)
}

/// Targets as `(count, width)`, whether they were squeezed to `(count,)` or not.
pub(crate) fn targets_to_tensor<B: Backend>(targets: &ArrayD<f64>, device: &B::Device) -> Tensor<B, 2> {
	let count = targets.shape().first().copied().unwrap_or(0);
	let width = targets.shape().iter().skip(1).product::<usize>();
	let flatten = targets.iter().map(|each| *each as f32).collect::<Vec<_>>();
	Tensor::from_data(TensorData::new(flatten, [count, width]), device)
}

pub(crate) fn tensor_to_array<B: Backend>(tensor: Tensor<B, 2>) -> Result<Array2<f64>> {
	let [rows, columns] = tensor.dims();
	let values = tensor.into_data().iter::<f64>().collect::<Vec<_>>();
	Ok(Array2::from_shape_vec((rows, columns), values)?)
}

pub(super) fn check_shapes(
	config: &TrainingConfig,
	train: &SegmentTensors,
	validation: &SegmentTensors,
	window_size: usize,
) -> Result<()> {
	if config.epochs == 0 || config.batch_size == 0 {
		return Err(ForecastError::validation(
			"Epochs and batch size must be positive integers",
		));
	}

	if train.is_empty() || validation.is_empty() {
		return Err(ForecastError::validation(
			"Training needs at least one window in both the train and validation segments",
		));
	}

	if window_size != config.model.input_size {
		return Err(ForecastError::validation(format!(
			"Model expects windows of {} steps, data has {}",
			config.model.input_size, window_size
		)));
	}

	if train.feature_size() != config.model.feature_size {
		return Err(ForecastError::validation(format!(
			"Model expects {} features per step, data has {}",
			config.model.feature_size,
			train.feature_size()
		)));
	}

	if train.target_width() != config.model.output_size {
		return Err(ForecastError::validation(format!(
			"Model outputs {} values, targets have {}",
			config.model.output_size,
			train.target_width()
		)));
	}

	Ok(())
}

pub(super) fn send_segments_to_device<B: AutodiffBackend>(
	train: &SegmentTensors,
	validation: &SegmentTensors,
	device: &B::Device,
) -> TrainInput<B> {
	TrainInput {
		train_tensor: inputs_to_tensor(train.inputs.view(), device),
		train_target_tensor: targets_to_tensor(&train.targets, device),
		valid_tensor: inputs_to_tensor(validation.inputs.view(), device),
		valid_target_tensor: targets_to_tensor(&validation.targets, device),
	}
}

/// One shuffled pass over the training windows. Returns the updated model and the sample-weighted
/// mean training loss.
pub(super) fn train_one_epoch<B, O>(
	mut model: LstmNetwork<B>,
	optim: &mut O,
	input: &TrainInput<B>,
	config: &TrainingConfig,
	rng: &mut StdRng,
	device: &B::Device,
) -> Result<(LstmNetwork<B>, f64)>
where
	B: AutodiffBackend,
	O: Optimizer<LstmNetwork<B>, B>,
{
	let num_items = input.train_tensor.dims()[0];
	let mut order = (0..num_items as i64).collect::<Vec<_>>();
	order.shuffle(rng);

	let mut train_loss = 0f64;
	for batch in order.chunks(config.batch_size) {
		let indices = Tensor::<B, 1, Int>::from_data(TensorData::new(batch.to_vec(), [batch.len()]), device);
		let inputs = input.train_tensor.clone().select(0, indices.clone());
		let targets = input.train_target_tensor.clone().select(0, indices);

		let output = model.forward(inputs);
		let loss = MseLoss::new().forward(output, targets, Mean);
		let value = loss.clone().into_scalar().elem::<f64>();

		if !value.is_finite() {
			return Err(ForecastError::validation(format!(
				"Training loss diverged to {value}"
			)));
		}
		train_loss += value * batch.len() as f64;

		// Gradients for the current backward pass
		let grads = loss.backward();
		// Gradients linked to each parameter of the model
		let grads = GradientsParams::from_grads(grads, &model);
		// Update the model using the optimizer
		model = optim.step(config.learning_rate, model, grads);
	}

	Ok((model, train_loss / num_items as f64))
}

pub(super) fn validation_loss<B: AutodiffBackend>(
	model: &LstmNetwork<B>,
	input: &TrainInput<B>,
) -> Result<f64> {
	let model = model.valid();
	let output = model.forward(input.valid_tensor.clone());
	let loss = MseLoss::new()
		.forward(output, input.valid_target_tensor.clone(), Mean)
		.into_scalar()
		.elem::<f64>();

	if !loss.is_finite() {
		return Err(ForecastError::validation(format!(
			"Validation loss diverged to {loss}"
		)));
	}

	Ok(loss)
}

#[cfg(test)]
mod tests {
	use super::*;
	use burn::backend::{ndarray::NdArrayDevice, NdArray};
	use ndarray::array;

	#[test]
	fn squeezed_targets_become_one_column() {
		let device = NdArrayDevice::Cpu;
		let targets = array![1.0, 2.0, 3.0].into_dyn();
		let tensor = targets_to_tensor::<NdArray>(&targets, &device);

		assert_eq!(tensor.dims(), [3, 1]);
		assert_eq!(tensor_to_array(tensor).unwrap(), array![[1.0], [2.0], [3.0]]);
	}

	#[test]
	fn inputs_keep_their_layout() {
		let device = NdArrayDevice::Cpu;
		let inputs = ndarray::Array3::from_shape_fn((2, 3, 2), |(i, j, k)| (i * 100 + j * 10 + k) as f64);
		let tensor = inputs_to_tensor::<NdArray>(inputs.view(), &device);

		assert_eq!(tensor.dims(), [2, 3, 2]);
		let flat = tensor.into_data().iter::<f64>().collect::<Vec<_>>();
		assert_eq!(flat[3], 11.0);
		assert_eq!(flat[11], 121.0);
	}
}
