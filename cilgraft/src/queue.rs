use std::collections::VecDeque;

use crate::error::Result;

/// Instruction clones must all exist before any operand
/// that points at a sibling instruction can be resolved; operands that point
/// into types still being cloned must wait until after type shells exist,
/// which type cloning already guarantees synchronously. Two priorities are
/// therefore sufficient.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Priority {
	Instructions,
	Operands,
}

/// A priority queue over deferred closures, created empty per top-level
/// entry call and drained to empty before that call returns.
/// Generic over the context type an action needs: `Ctx` is
/// `clone::CloneContext` in every real use, but keeping the queue itself
/// ignorant of that type avoids a dependency cycle between this module and
/// `clone`.
pub struct DeferredActionQueue<'l, Ctx> {
	instructions: VecDeque<Action<'l, Ctx>>,
	operands: VecDeque<Action<'l, Ctx>>,
}

pub(crate) type Action<'l, Ctx> = Box<dyn FnOnce(&mut Ctx) -> Result<()> + 'l>;

impl<'l, Ctx> Default for DeferredActionQueue<'l, Ctx> {
	fn default() -> Self {
		Self { instructions: VecDeque::new(), operands: VecDeque::new() }
	}
}

impl<'l, Ctx> DeferredActionQueue<'l, Ctx> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn schedule<F>(&mut self, priority: Priority, action: F)
	where
		F: FnOnce(&mut Ctx) -> Result<()> + 'l,
	{
		match priority {
			Priority::Instructions => self.instructions.push_back(Box::new(action)),
			Priority::Operands => self.operands.push_back(Box::new(action)),
		}
	}

	/// Pops the next action in priority order without running it — the
	/// caller runs it against whatever borrow of `Ctx` it can construct once
	/// this borrow of the queue has ended.
	pub fn pop_next(&mut self) -> Option<Action<'l, Ctx>> {
		self.instructions.pop_front().or_else(|| self.operands.pop_front())
	}

	pub fn is_empty(&self) -> bool {
		self.instructions.is_empty() && self.operands.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Log(Vec<&'static str>);

	#[test]
	fn drains_instructions_before_operands_even_when_scheduled_later() {
		let mut queue: DeferredActionQueue<Log> = DeferredActionQueue::new();

		queue.schedule(Priority::Operands, |log: &mut Log| {
			log.0.push("operand");
			Ok(())
		});
		queue.schedule(Priority::Instructions, |log: &mut Log| {
			log.0.push("instruction");
			log.0.push("instruction-2");
			Ok(())
		});

		let mut log = Log(Vec::new());
		while let Some(action) = queue.pop_next() {
			action(&mut log).unwrap();
		}

		assert_eq!(log.0, vec!["instruction", "instruction-2", "operand"]);
	}
}
