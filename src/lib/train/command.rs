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

use std::path::{Path, PathBuf};

use burn::{module::AutodiffModule, optim::Optimizer, tensor::backend::AutodiffBackend};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};

use super::helper::*;
use super::model::*;
use super::typedef::*;
use crate::error::{ForecastError, Result};
use crate::preprocess::typedef::Preprocessed;

/// Synchronous training run. Yields one [`TrainEvent::Epoch`] per pass over the training windows and
/// ends with exactly one [`TrainEvent::Completed`] or [`TrainEvent::Failed`].
pub struct Trainer<B: AutodiffBackend, O> {
	config: TrainingConfig,
	model: Option<LstmNetwork<B>>,
	optim: O,
	input: TrainInput<B>,
	checkpoint_dir: PathBuf,
	device: B::Device,
	rng: StdRng,
	epoch: usize,
	best_loss: f64,
	best_epoch: usize,
	history: LossHistory,
	finished: bool,
}

/// Prepares a run over the train and validation windows of `preprocessed`. Every improvement of the
/// validation loss overwrites the checkpoint in `checkpoint_dir`.
pub fn train<B: AutodiffBackend>(
	config: TrainingConfig,
	preprocessed: &Preprocessed,
	checkpoint_dir: impl AsRef<Path>,
	device: &B::Device,
) -> Result<Trainer<B, impl Optimizer<LstmNetwork<B>, B>>> {
	config.model.validate()?;
	check_shapes(
		&config,
		&preprocessed.train,
		&preprocessed.validation,
		preprocessed.window_size,
	)?;

	let seed = config.seed.unwrap_or_else(rand::random);
	B::seed(seed);

	let model = config.model.init::<B>(device)?;
	let optim = config.optimizer.init::<B, LstmNetwork<B>>();
	let input = send_segments_to_device::<B>(&preprocessed.train, &preprocessed.validation, device);

	info!(
		seed,
		epochs = config.epochs,
		batch_size = config.batch_size,
		train_windows = preprocessed.train.len(),
		validation_windows = preprocessed.validation.len(),
		"Training started"
	);

	Ok(Trainer {
		model: Some(model),
		optim,
		input,
		checkpoint_dir: checkpoint_dir.as_ref().to_path_buf(),
		device: device.clone(),
		rng: StdRng::seed_from_u64(seed),
		epoch: 0,
		best_loss: f64::INFINITY,
		best_epoch: 0,
		history: LossHistory::default(),
		finished: false,
		config,
	})
}

impl<B, O> Trainer<B, O>
where
	B: AutodiffBackend,
	O: Optimizer<LstmNetwork<B>, B>,
{
	pub fn config(&self) -> &TrainingConfig {
		&self.config
	}

	pub fn history(&self) -> &LossHistory {
		&self.history
	}

	fn run_epoch(&mut self) -> Result<EpochReport> {
		let model = self
			.model
			.take()
			.ok_or_else(|| ForecastError::validation("The model was lost after a failed epoch"))?;

		let (model, train_loss) = train_one_epoch(
			model,
			&mut self.optim,
			&self.input,
			&self.config,
			&mut self.rng,
			&self.device,
		)?;
		let validation_loss = validation_loss(&model, &self.input)?;

		self.epoch += 1;
		self.history.push(train_loss, validation_loss);

		let improved = validation_loss < self.best_loss;
		if improved {
			model
				.valid()
				.save_checkpoint(&self.config.model, &self.checkpoint_dir)?;
			self.best_loss = validation_loss;
			self.best_epoch = self.epoch;
		}

		self.model = Some(model);

		Ok(EpochReport {
			epoch: self.epoch,
			epochs: self.config.epochs,
			train_loss,
			validation_loss,
			improved,
		})
	}

	fn complete(&mut self) -> Result<TrainedForecaster<B::InnerBackend>> {
		let (model, config) =
			LstmNetwork::<B::InnerBackend>::load_checkpoint(&self.checkpoint_dir, &self.device)?;

		info!(
			best_epoch = self.best_epoch,
			best_validation_loss = self.best_loss,
			"Training finished, best checkpoint reloaded"
		);

		Ok(TrainedForecaster {
			model,
			config,
			history: std::mem::take(&mut self.history),
			best_epoch: self.best_epoch,
		})
	}
}

impl<B, O> Iterator for Trainer<B, O>
where
	B: AutodiffBackend,
	O: Optimizer<LstmNetwork<B>, B>,
{
	type Item = TrainEvent<B::InnerBackend>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.finished {
			return None;
		}

		if self.epoch < self.config.epochs {
			return match self.run_epoch() {
				Ok(report) => Some(TrainEvent::Epoch(report)),
				Err(err) => {
					self.finished = true;
					warn!(epoch = self.epoch + 1, error = %err, "Training failed");
					Some(TrainEvent::Failed(ForecastError::training(err)))
				}
			};
		}

		self.finished = true;
		Some(match self.complete() {
			Ok(trained) => TrainEvent::Completed(trained),
			Err(err) => TrainEvent::Failed(ForecastError::training(err)),
		})
	}
}

/// Drives [`train`] to its end, logging every epoch.
pub fn fit<B: AutodiffBackend>(
	config: TrainingConfig,
	preprocessed: &Preprocessed,
	checkpoint_dir: impl AsRef<Path>,
	device: &B::Device,
) -> Result<TrainedForecaster<B::InnerBackend>> {
	for event in train::<B>(config, preprocessed, checkpoint_dir, device)? {
		match event {
			TrainEvent::Epoch(report) => {
				info!(
					epoch = report.epoch,
					epochs = report.epochs,
					loss = report.train_loss,
					val_loss = report.validation_loss,
					improved = report.improved,
					"Epoch finished"
				);
			}
			TrainEvent::Completed(trained) => return Ok(trained),
			TrainEvent::Failed(err) => return Err(err),
		}
	}

	debug!("Training iterator ended without a terminal event");
	Err(ForecastError::training(ForecastError::validation(
		"Training ended without producing a model",
	)))
}
