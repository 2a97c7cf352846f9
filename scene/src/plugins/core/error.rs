use attachment::AttachResult;
use bevy::prelude::*;

pub struct ErrorPlugin;

impl Plugin for ErrorPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ErrorEvent>();
        app.add_systems(Last, read_errors);
    }
}

#[derive(Event)]
pub struct ErrorEvent(pub anyhow::Error);

pub fn read_errors(mut events: EventReader<ErrorEvent>) {
    for ErrorEvent(error) in events.read() {
        error!("Error: {error:?}");
    }
}

/// For system piping
pub fn handle_errors(In(rst): In<anyhow::Result<()>>, mut events: EventWriter<ErrorEvent>) {
    if let Err(err) = rst {
        events.send(ErrorEvent(err));
    }
}

/// Recoverable attachment errors are a no-op and only warrant a warning, the rest are reported
pub fn report_attach(rst: AttachResult<()>, events: &mut EventWriter<ErrorEvent>) {
    match rst {
        Ok(()) => {}
        Err(err) if err.is_recoverable() => warn!("Ignored: {err}"),
        Err(err) => {
            events.send(ErrorEvent(err.into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use attachment::{AttachError, ObjectId};

    use super::*;

    fn report(mut events: EventWriter<ErrorEvent>) {
        report_attach(Ok(()), &mut events);
        report_attach(
            Err(AttachError::Vetoed {
                entity: ObjectId(1),
                host: ObjectId(2),
            }),
            &mut events,
        );
        report_attach(Err(AttachError::UnknownEntity(ObjectId(9))), &mut events);
    }

    #[test]
    fn only_misconfiguration_becomes_an_error_event() {
        let mut app = App::new();
        app.add_plugins(ErrorPlugin).add_systems(Update, report);

        app.update();

        let events = app.world.resource::<Events<ErrorEvent>>();
        assert_eq!(events.len(), 1);
    }
}
