use anyhow::Result;
use armrl_core::{
    dummy::{DummyEnv, DummyEnvConfig, DummyPolicy},
    replay_buffer::TransitionProcessorConfig,
    ArrayObs, DiscreteAct, Env, ExperienceBufferBase, ReplayBufferBase, ReplayMemory,
    ReplayMemoryConfig, Sampler, StepProcessor, Transition, TransitionProcessor,
};

type Buffer = ReplayMemory<Transition<ArrayObs, DiscreteAct>>;

#[test]
fn sampled_transitions_follow_the_environment() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let env = DummyEnv::build(&DummyEnvConfig::default().length(3).max_steps(10), 0)?;
    let processor = TransitionProcessor::build(&TransitionProcessorConfig::default());
    let mut sampler = Sampler::new(env, processor);
    let mut buffer = Buffer::build(&ReplayMemoryConfig::default().capacity(4))?;
    let mut policy = DummyPolicy::right();

    let mut n_episodes = 0;
    for _ in 0..9 {
        let record = sampler.sample_and_push(&mut policy, &mut buffer)?;
        if record.get_scalar("episode_return").is_ok() {
            n_episodes += 1;
        }
    }
    assert_eq!(n_episodes, 3);
    assert_eq!(ExperienceBufferBase::len(&buffer), 4);

    // moving right from s, the next state is s + 1 unless the goal was reached
    let batch = buffer.batch(4)?;
    for i in 0..batch.len() {
        let s = batch.state[i].0[0];
        match &batch.next_state[i] {
            Some(next) => assert_eq!(next.0[0], s + 1.0),
            None => {
                assert_eq!(s, 2.0);
                assert_eq!(batch.reward[i], 1.0);
            }
        }
    }
    Ok(())
}

#[test]
fn truncated_episodes_keep_next_state() -> Result<()> {
    let env = DummyEnv::build(&DummyEnvConfig::default().length(5).max_steps(2), 0)?;
    let processor = TransitionProcessor::build(&TransitionProcessorConfig::default());
    let mut sampler = Sampler::new(env, processor);
    let mut buffer = Buffer::build(&ReplayMemoryConfig::default().capacity(10))?;
    let mut policy = DummyPolicy::left();

    for _ in 0..4 {
        sampler.sample_and_push(&mut policy, &mut buffer)?;
    }
    assert!(buffer.iter().all(|tr| !tr.is_terminal()));
    Ok(())
}
